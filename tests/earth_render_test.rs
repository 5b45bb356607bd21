#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod globe {
    use std::iter;

    use earth_globe::{
        config::SceneConfig, context::Viewport, earth::EarthScene, render::read_texture,
    };

    use crate::common::{self, BACKDROP, FORMAT};

    async fn draw(scene: &EarthScene, device: &wgpu::Device, queue: &wgpu::Queue) -> image::RgbaImage {
        let [width, height] = scene.viewport().size();
        let output = common::target(device, width, height);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("test encoder"),
        });
        scene.render(&mut encoder, &output.view);
        queue.submit(iter::once(encoder.finish()));
        read_texture(device, queue, &output.texture)
            .await
            .expect("Failed to read back the frame")
    }

    #[tokio::test]
    async fn globe_is_drawn_over_the_starfield() {
        let (device, queue) = common::headless().await;
        let textures = common::solid_textures(&device, &queue);
        let scene = EarthScene::with_textures(
            &device,
            &queue,
            FORMAT,
            Viewport::new(128, 96),
            SceneConfig::default(),
            textures,
        );

        let img = draw(&scene, &device, &queue).await;
        assert_eq!(img.dimensions(), (128, 96));

        // The main pass keeps the background it is drawn over
        for (x, y) in [(0, 0), (127, 0), (0, 95), (127, 95)] {
            assert_eq!(img.get_pixel(x, y).0, BACKDROP, "corner ({x}, {y})");
        }

        // The lit half of the Earth faces the camera
        let centre = img.get_pixel(64, 48).0;
        assert!(centre[0] > 64, "centre pixel {centre:?} is not lit");
        assert_ne!(centre, BACKDROP);
    }

    #[tokio::test]
    async fn resize_rebuilds_the_frame() {
        let (device, queue) = common::headless().await;
        let textures = common::solid_textures(&device, &queue);
        let mut scene = EarthScene::with_textures(
            &device,
            &queue,
            FORMAT,
            Viewport::new(64, 64),
            SceneConfig::default(),
            textures,
        );

        assert!((scene.projection.aspect - 1.0).abs() < 1e-6);

        scene.resize(&device, &queue, 160, 90);
        assert!((scene.projection.aspect - 160.0 / 90.0).abs() < 1e-6);
        assert_eq!(scene.composer.size(), [160, 90]);
        assert_eq!(scene.background_projection.right, 160.0);

        // Minimised windows report zero sizes
        scene.resize(&device, &queue, 0, 0);
        assert_eq!(scene.viewport().size(), [160, 90]);
        assert_eq!(scene.composer.size(), [160, 90]);
        assert!((scene.projection.aspect - 160.0 / 90.0).abs() < 1e-6);

        let img = draw(&scene, &device, &queue).await;
        assert_eq!(img.dimensions(), (160, 90));
        assert_eq!(img.get_pixel(0, 0).0, BACKDROP);
        assert_eq!(img.get_pixel(159, 89).0, BACKDROP);
        assert_ne!(img.get_pixel(80, 45).0, BACKDROP);
    }

    #[tokio::test]
    async fn missing_assets_fall_back_to_placeholders() {
        let (device, queue) = common::headless().await;
        let mut config = SceneConfig::default();
        config.background.texture = "does_not_exist.jpg".to_string();
        config.earth.diffuse_map = "does_not_exist.jpg".to_string();

        let scene = EarthScene::new(&device, &queue, FORMAT, Viewport::new(32, 32), config).await;
        let img = draw(&scene, &device, &queue).await;
        // The white placeholder backdrop shows in the corners
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[tokio::test]
    async fn missing_cloud_map_leaves_the_earth_visible() {
        let (device, queue) = common::headless().await;
        let mut config = SceneConfig::default();
        for file in [
            &mut config.earth.diffuse_map,
            &mut config.earth.normal_map,
            &mut config.earth.specular_map,
            &mut config.cloud.alpha_map,
            &mut config.background.texture,
        ] {
            *file = format!("missing_{file}");
        }

        let viewport = Viewport::new(64, 48);
        let loaded = EarthScene::new(&device, &queue, FORMAT, viewport, config.clone()).await;
        let cloudless = EarthScene::with_textures(
            &device,
            &queue,
            FORMAT,
            viewport,
            config,
            common::placeholder_textures(&device, &queue),
        );

        let with_missing_clouds = draw(&loaded, &device, &queue).await;
        let without_clouds = draw(&cloudless, &device, &queue).await;
        assert_eq!(
            with_missing_clouds.get_pixel(32, 24),
            without_clouds.get_pixel(32, 24)
        );
        assert_eq!(with_missing_clouds, without_clouds);
    }
}
