//! Area-lit torus knot on a floor, orbiting camera.
//!
//! Space toggles the auto-rotation.

use showroom::prelude::*;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

struct Basic;

impl AppHandler for Basic {
    fn init(controller: &mut RenderLoopController, backend: Box<dyn RenderBackend>, window: &WindowInfo) -> Result<Self> {
        let (width, height) = window.logical_size;
        let config = Showcase::Basic
            .config()
            .with_viewport(width, height)
            .with_pixel_ratio(window.scale_factor);

        let bundle = SceneGraphBuilder::new(config.clone()).build(backend)?;
        Showcase::Basic.attach(controller, bundle, &config)?;
        Ok(Self)
    }

    fn on_event(&mut self, controller: &mut RenderLoopController, event: &WindowEvent) -> bool {
        if let WindowEvent::KeyboardInput { event, .. } = event
            && event.state == ElementState::Pressed
            && event.physical_key == PhysicalKey::Code(KeyCode::Space)
            && let Some(controls) = controller.controls_mut()
        {
            controls.auto_rotate = !controls.auto_rotate;
            log::info!("Auto-rotate {}", if controls.auto_rotate { "on" } else { "off" });
            return true;
        }
        false
    }
}

fn main() -> Result<()> {
    init_logging();
    App::new().with_title("Showroom | Basic").run::<Basic>()
}
