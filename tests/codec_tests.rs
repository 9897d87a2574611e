use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sqz::{ColorMode, ImageDescriptor, ScanOrder, SqzError, HEADER_SIZE};

fn descriptor(
    color_mode: ColorMode,
    scan_order: ScanOrder,
    width: usize,
    height: usize,
    dwt_levels: usize,
) -> ImageDescriptor {
    ImageDescriptor {
        color_mode,
        scan_order,
        width,
        height,
        dwt_levels,
        subsampling: false,
    }
}

/// Encodes with a budget guaranteed to hold the lossless stream.
fn encode_full(pixels: &[u8], descriptor: &mut ImageDescriptor) -> Vec<u8> {
    let mut stream = vec![0u8; descriptor.pixel_len() * 2 + 1024];
    let written = sqz::encode(pixels, &mut stream, descriptor).expect("encode");
    stream.truncate(written);
    stream
}

fn decode_full(stream: &[u8]) -> (ImageDescriptor, Vec<u8>) {
    let info = sqz::probe(stream).expect("probe");
    let mut pixels = vec![0u8; info.pixel_len()];
    let decoded = sqz::decode(stream, &mut pixels).expect("decode");
    assert_eq!(decoded, info);
    (info, pixels)
}

fn mse(a: &[u8], b: &[u8]) -> f64 {
    assert_eq!(a.len(), b.len());
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum();
    sum / a.len() as f64
}

fn ramp_16x16() -> Vec<u8> {
    let mut pixels = vec![0u8; 256];
    for y in 0..16 {
        for x in 0..16 {
            pixels[y * 16 + x] = (((x + y) * 8) % 256) as u8;
        }
    }
    pixels
}

fn noise_rgb(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height * 3).map(|_| rng.gen()).collect()
}

#[test]
fn test_solid_gray_8x8_round_trips_at_any_budget() {
    let pixels = vec![200u8; 64];
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Raster, 8, 8, 1);
    let stream = encode_full(&pixels, &mut desc);
    assert_eq!(stream[0], 0xA5, "magic byte opens the stream");

    let (info, decoded) = decode_full(&stream);
    assert_eq!((info.width, info.height), (8, 8));
    assert_eq!(decoded, pixels, "full stream is lossless");

    // every prefix from 8 bytes up decodes to a valid 8x8 image
    for budget in 8..=stream.len() {
        let mut out = vec![0u8; 64];
        let info = sqz::decode(&stream[..budget], &mut out).expect("truncated decode");
        assert_eq!((info.width, info.height), (8, 8));
    }
}

#[test]
fn test_ramp_snake_lossless_and_monotone() {
    let pixels = ramp_16x16();
    // dwt_levels 3 exceeds what 16x16 supports; the encoder clamps it
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Snake, 16, 16, 3);
    let mut stream = vec![0u8; 512];
    let written = sqz::encode(&pixels, &mut stream, &mut desc).expect("encode");
    assert_eq!(desc.dwt_levels, 2, "levels clamped to ilog2(16) - 3");
    assert!(written <= 512);
    stream.truncate(written);

    let (_, decoded) = decode_full(&stream);
    assert_eq!(decoded, pixels, "lossless at budget 512");

    let decode_prefix = |budget: usize| {
        let mut out = vec![0u8; 256];
        let info = sqz::decode(&stream[..budget.min(stream.len())], &mut out).expect("decode");
        assert_eq!((info.width, info.height), (16, 16));
        mse(&pixels, &out)
    };
    let coarse = decode_prefix(16);
    let fine = decode_prefix(32);
    assert!(
        fine < coarse,
        "MSE at 32 bytes ({fine}) must beat MSE at 16 bytes ({coarse})"
    );
}

#[test]
fn test_noise_ycocg_lossless_round_trip() {
    let pixels = noise_rgb(64, 64, 0x5EED);
    let mut desc = descriptor(ColorMode::YcocgR, ScanOrder::Snake, 64, 64, 4);
    // two bytes per coefficient always holds the lossless stream
    let mut stream = vec![0u8; 64 * 64 * 3 * 2];
    let written = sqz::encode(&pixels, &mut stream, &mut desc).expect("encode");
    stream.truncate(written);

    let (info, decoded) = decode_full(&stream);
    assert_eq!(info.color_mode, ColorMode::YcocgR);
    assert_eq!(decoded, pixels, "noise round-trips bit-exactly");
}

#[test]
fn test_truncated_noise_quality_improves_with_budget() {
    let pixels = noise_rgb(32, 32, 42);
    let mut desc = descriptor(ColorMode::YcocgR, ScanOrder::Hilbert, 32, 32, 2);
    let stream = encode_full(&pixels, &mut desc);

    let mut previous = f64::INFINITY;
    for budget in [16usize, 64, 256, 1024, stream.len()] {
        let budget = budget.min(stream.len());
        let mut out = vec![0u8; pixels.len()];
        sqz::decode(&stream[..budget], &mut out).expect("decode");
        let error = mse(&pixels, &out);
        assert!(
            error <= previous,
            "quality must not degrade with budget ({budget} bytes: {error} > {previous})"
        );
        previous = error;
    }
    assert_eq!(previous, 0.0, "full stream is exact");
}

#[test]
fn test_prefix_property_every_cut_is_a_valid_image() {
    let pixels = ramp_16x16();
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Morton, 16, 16, 2);
    let stream = encode_full(&pixels, &mut desc);
    let reference = sqz::probe(&stream).unwrap();

    for k in HEADER_SIZE..=stream.len() {
        let mut out = vec![0u8; 256];
        let info = sqz::decode(&stream[..k], &mut out)
            .unwrap_or_else(|e| panic!("prefix of {k} bytes must decode: {e}"));
        assert_eq!(info, reference, "descriptor is stable across prefixes");
    }
}

#[test]
fn test_encoding_is_deterministic_even_into_dirty_buffers() {
    let pixels = noise_rgb(16, 16, 7);
    let mut desc = descriptor(ColorMode::LogL1, ScanOrder::Raster, 16, 16, 1);

    let mut clean = vec![0u8; 4096];
    let mut dirty = vec![0xFFu8; 4096];
    let a = sqz::encode(&pixels, &mut clean, &mut desc.clone()).unwrap();
    let b = sqz::encode(&pixels, &mut dirty, &mut desc).unwrap();
    assert_eq!(a, b);
    assert_eq!(clean[..a], dirty[..b], "output is independent of buffer contents");
}

#[test]
fn test_all_modes_and_orders() {
    let rgb = noise_rgb(16, 16, 99);
    let gray: Vec<u8> = rgb.chunks_exact(3).map(|p| p[0]).collect();
    for mode in [
        ColorMode::Grayscale,
        ColorMode::YcocgR,
        ColorMode::Oklab,
        ColorMode::LogL1,
    ] {
        for order in [
            ScanOrder::Raster,
            ScanOrder::Snake,
            ScanOrder::Morton,
            ScanOrder::Hilbert,
        ] {
            let pixels: &[u8] = if mode.planes() == 1 { &gray } else { &rgb };
            let mut desc = descriptor(mode, order, 16, 16, 2);
            let stream = encode_full(pixels, &mut desc);
            let (info, decoded) = decode_full(&stream);
            assert_eq!(info.color_mode, mode);
            assert_eq!(info.scan_order, order);
            if mode.is_reversible() {
                assert_eq!(decoded, *pixels, "{mode:?}/{order:?} must be lossless");
            } else {
                // lossy modes must still be deterministic end to end
                let (_, again) = decode_full(&stream);
                assert_eq!(decoded, again);
            }
        }
    }
}

#[test]
fn test_subsampling_reorders_but_stays_lossless() {
    let pixels = noise_rgb(16, 16, 3);
    let mut plain = descriptor(ColorMode::YcocgR, ScanOrder::Snake, 16, 16, 2);
    let mut delayed = plain;
    delayed.subsampling = true;

    let a = encode_full(&pixels, &mut plain);
    let b = encode_full(&pixels, &mut delayed);
    assert_ne!(a, b, "subsampling changes the bit order");
    assert_eq!(decode_full(&a).1, pixels);
    assert_eq!(decode_full(&b).1, pixels, "only priority changes, not content");
}

#[test]
fn test_degenerate_minimum_image_and_budget() {
    // 8x8 is the smallest legal image; a budget of 8 bytes holds the header
    // and the first few LL bits without overrun
    let pixels = vec![77u8; 64];
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Hilbert, 8, 8, 1);
    let mut stream = vec![0u8; 8];
    let written = sqz::encode(&pixels, &mut stream, &mut desc).expect("encode");
    assert!(written >= HEADER_SIZE && written <= 8);
    assert_eq!(stream[0], 0xA5);

    let mut out = vec![0u8; 64];
    let info = sqz::decode(&stream[..written], &mut out).expect("decode");
    assert_eq!((info.width, info.height), (8, 8));
}

#[test]
fn test_budget_below_header_is_too_small() {
    let pixels = vec![0u8; 64];
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Raster, 8, 8, 1);
    let mut stream = vec![0u8; HEADER_SIZE - 1];
    assert_eq!(
        sqz::encode(&pixels, &mut stream, &mut desc),
        Err(SqzError::BufferTooSmall {
            required: HEADER_SIZE
        })
    );
}

#[test]
fn test_flipped_magic_is_invalid_parameter() {
    let pixels = vec![1u8; 64];
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Raster, 8, 8, 1);
    let mut stream = encode_full(&pixels, &mut desc);
    stream[0] = 0x00;
    let mut out = vec![0u8; 64];
    assert!(matches!(
        sqz::decode(&stream, &mut out),
        Err(SqzError::InvalidParameter(_))
    ));
}

#[test]
fn test_declared_7x7_dimensions_are_corrupted_data() {
    let pixels = vec![1u8; 64];
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Raster, 8, 8, 1);
    let mut stream = encode_full(&pixels, &mut desc);
    // width - 1 and height - 1 are 16-bit big-endian fields after the magic
    stream[1] = 0;
    stream[2] = 6;
    stream[3] = 0;
    stream[4] = 6;
    let mut out = vec![0u8; 64];
    assert!(matches!(
        sqz::decode(&stream, &mut out),
        Err(SqzError::DataCorrupted(_))
    ));
}

#[test]
fn test_decode_into_short_buffer_reports_required_size() {
    let pixels = noise_rgb(16, 16, 11);
    let mut desc = descriptor(ColorMode::YcocgR, ScanOrder::Raster, 16, 16, 1);
    let stream = encode_full(&pixels, &mut desc);

    let info = sqz::probe(&stream).unwrap();
    assert_eq!(info.pixel_len(), 16 * 16 * 3);

    let mut short = vec![0u8; 16];
    assert_eq!(
        sqz::decode(&stream, &mut short),
        Err(SqzError::BufferTooSmall {
            required: 16 * 16 * 3
        })
    );
}

#[test]
fn test_invalid_encode_parameters_are_rejected() {
    let pixels = vec![0u8; 7 * 7];
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Raster, 7, 7, 1);
    let mut stream = vec![0u8; 256];
    assert!(matches!(
        sqz::encode(&pixels, &mut stream, &mut desc),
        Err(SqzError::InvalidParameter(_))
    ));

    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Raster, 8, 8, 1);
    assert!(matches!(
        sqz::encode(&pixels, &mut stream, &mut desc),
        Err(SqzError::InvalidParameter(_)),
    ), "source buffer shorter than the image is rejected");
}

#[test]
fn test_larger_images_with_odd_dimensions() {
    let mut rng = StdRng::seed_from_u64(0xDEAD);
    let (width, height) = (61, 45);
    let pixels: Vec<u8> = (0..width * height).map(|_| rng.gen()).collect();
    let mut desc = descriptor(ColorMode::Grayscale, ScanOrder::Snake, width, height, 2);
    let stream = encode_full(&pixels, &mut desc);
    let (info, decoded) = decode_full(&stream);
    assert_eq!((info.width, info.height), (width, height));
    assert_eq!(decoded, pixels);
}
