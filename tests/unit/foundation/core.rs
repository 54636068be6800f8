use super::*;

#[test]
fn canvas_rejects_empty_and_oversized() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert_eq!(Canvas::new(1000, 1000).unwrap().dims_u16().unwrap(), (1000, 1000));
}

#[test]
fn half_alpha_rounds_to_128() {
    let c = Rgba8::with_alpha_f32(0, 0, 0, 0.5);
    assert_eq!(c, Rgba8::new(0, 0, 0, 128));
}

#[test]
fn premultiply_scales_channels_by_alpha() {
    assert_eq!(Rgba8::opaque(10, 20, 30).premultiplied(), [10, 20, 30, 255]);
    assert_eq!(
        Rgba8::new(255, 255, 255, 128).premultiplied(),
        [128, 128, 128, 128]
    );
    assert_eq!(Rgba8::new(200, 100, 50, 0).premultiplied(), [0, 0, 0, 0]);
}
