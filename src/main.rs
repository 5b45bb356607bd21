use earth_globe::{config::SceneConfig, flow};

fn main() -> anyhow::Result<()> {
    flow::run(SceneConfig::default())
}
