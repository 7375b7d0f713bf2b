mod tests {
    use myrtio_pixel_effects::color::{Rgb, rgb_from_u32, rgb_to_u32, wheel};

    fn max_channel_step(a: Rgb, b: Rgb) -> u8 {
        a.r.abs_diff(b.r).max(a.g.abs_diff(b.g)).max(a.b.abs_diff(b.b))
    }

    #[test]
    fn test_wheel_primaries() {
        assert_eq!(wheel(0), Rgb::new(255, 0, 0));
        assert_eq!(wheel(85), Rgb::new(0, 255, 0));
        assert_eq!(wheel(170), Rgb::new(0, 0, 255));
        assert_eq!(wheel(255), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_wheel_band_edges() {
        // Inverted position 84 / 85 and 169 / 170
        assert_eq!(wheel(171), Rgb::new(3, 0, 252));
        assert_eq!(wheel(170), Rgb::new(0, 0, 255));
        assert_eq!(wheel(86), Rgb::new(0, 252, 3));
        assert_eq!(wheel(85), Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_wheel_is_continuous() {
        for position in 0..255u8 {
            let step = max_channel_step(wheel(position), wheel(position + 1));
            assert!(step <= 3, "jump of {step} at {position}");
        }
        assert!(max_channel_step(wheel(0), wheel(255)) <= 3);
    }

    #[test]
    fn test_wheel_keeps_full_intensity() {
        for position in 0..=255u8 {
            let color = wheel(position);
            let sum = u16::from(color.r) + u16::from(color.g) + u16::from(color.b);
            assert_eq!(sum, 255);
        }
    }

    #[test]
    fn test_packed_colors() {
        assert_eq!(rgb_from_u32(0xFF0000), Rgb::new(255, 0, 0));
        assert_eq!(rgb_from_u32(0x12_34_56), Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(rgb_from_u32(0xAB_00_00_FF), Rgb::new(0, 0, 255));
        assert_eq!(rgb_to_u32(Rgb::new(0x12, 0x34, 0x56)), 0x12_34_56);
    }
}
