//! Streams a glTF model, then an environment panorama, into a spot-lit
//! stage. The frame loop starts once the model is in the scene.
//!
//! Assets are read from `demos/assets` unless `SHOWROOM_ASSETS` points
//! elsewhere (a directory, or a base URL with the `http` feature):
//!
//! ```text
//! demos/assets/models/test.glb
//! demos/assets/env/studio_small_08_2k.jpg
//! ```

use showroom::prelude::*;

const DEFAULT_ASSET_ROOT: &str = "demos/assets";

struct Loader;

impl AppHandler for Loader {
    fn init(controller: &mut RenderLoopController, backend: Box<dyn RenderBackend>, window: &WindowInfo) -> Result<Self> {
        let (width, height) = window.logical_size;
        let config = Showcase::Loader
            .config()
            .with_viewport(width, height)
            .with_pixel_ratio(window.scale_factor);

        let bundle = SceneGraphBuilder::new(config.clone()).build(backend)?;
        Showcase::Loader.attach(controller, bundle, &config)?;

        let root = std::env::var("SHOWROOM_ASSETS").unwrap_or_else(|_| DEFAULT_ASSET_ROOT.to_string());
        log::info!("Reading assets from {root}");

        let mut pipeline = AssetLoadPipeline::new(AssetReaderVariant::from_source(&root)?);
        pipeline.on_progress(|stage, progress| match progress {
            LoadProgress::Percent(p) => log::info!("{stage}: {p}%"),
            LoadProgress::Indeterminate => log::info!("{stage}: loading"),
        });

        if let Some((mesh, environment)) = Showcase::Loader.asset_requests() {
            pipeline.load(mesh, Some(environment));
        }
        controller.attach_loader(pipeline);
        Ok(Self)
    }

    fn update(&mut self, controller: &mut RenderLoopController, report: &FrameReport) {
        if report.assets_applied > 0
            && let Some(loader) = controller.loader()
        {
            log::info!("Loader state: {:?}", loader.state());
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    App::new().with_title("Showroom | Loader").run::<Loader>()
}
