//! Icosahedron whose standard material is patched with a time-driven
//! displacement before its first compile.

use showroom::prelude::*;

struct Shaders;

impl AppHandler for Shaders {
    fn init(controller: &mut RenderLoopController, backend: Box<dyn RenderBackend>, window: &WindowInfo) -> Result<Self> {
        let (width, height) = window.logical_size;
        let config = Showcase::Shaders
            .config()
            .with_viewport(width, height)
            .with_pixel_ratio(window.scale_factor);

        let bundle = SceneGraphBuilder::new(config.clone()).build(backend)?;
        Showcase::Shaders.attach(controller, bundle, &config)?;
        Ok(Self)
    }
}

fn main() -> Result<()> {
    init_logging();
    App::new().with_title("Showroom | Shaders").run::<Shaders>()
}
