use super::*;

#[test]
fn new_validates_channels_and_length() {
    assert!(ChannelImage::new(2, 2, 1, vec![0.0; 4]).is_ok());
    assert!(ChannelImage::new(2, 2, 3, vec![0.0; 12]).is_ok());
    assert!(matches!(
        ChannelImage::new(2, 2, 2, vec![0.0; 8]),
        Err(CampathError::ShapeMismatch(_))
    ));
    assert!(ChannelImage::new(2, 2, 3, vec![0.0; 11]).is_err());
}

#[test]
fn filled_repeats_value_per_pixel() {
    let img = ChannelImage::filled(3, 2, &[0.1, 0.2, 0.3]).unwrap();
    assert_eq!(img.channels(), 3);
    assert_eq!(img.pixel(2, 1), &[0.1, 0.2, 0.3]);
}

#[test]
fn vstack_puts_self_on_top() {
    let top = ChannelImage::filled(2, 1, &[1.0]).unwrap();
    let bottom = ChannelImage::filled(2, 2, &[0.0]).unwrap();
    let out = top.vstack(&bottom).unwrap();
    assert_eq!(out.height(), 3);
    assert_eq!(out.pixel(0, 0), &[1.0]);
    assert_eq!(out.pixel(1, 2), &[0.0]);

    let wide = ChannelImage::filled(3, 1, &[0.0]).unwrap();
    assert!(out.vstack(&wide).is_err());
}
