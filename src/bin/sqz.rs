// src/bin/sqz.rs
//
// Thin encode/decode demo around the sqz library. Raster I/O goes through
// the `image` crate; the codec itself only ever sees raw pixel buffers.

use sqz::{ColorMode, ImageDescriptor, ScanOrder};

use std::path::Path;

fn usage(progname: &str) {
    eprintln!("Usage: {progname} [-h] [-c budget] [-d] [-l levels] [-m mode] [-o order] [-s] input output");
    eprintln!("SQZ encode/decode an image.");
    eprintln!();
    eprintln!("  -c budget    Requested output size in bytes (default: lossless)");
    eprintln!("  -d           Decode an .sqz stream into a PNG");
    eprintln!("  -l levels    Number of DWT decompositions (default: 5)");
    eprintln!("  -m mode      Color mode: 0 grayscale, 1 YCoCg-R, 2 Oklab, 3 logl1 (default: 1)");
    eprintln!("  -o order     Scan order: 0 raster, 1 snake, 2 Morton, 3 Hilbert (default: 1)");
    eprintln!("  -s           Delay chroma bitplanes (acts as subsampling when truncating)");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    // A simple helper to find the value of a command-line flag.
    let find_arg_value = |flag: &str| -> Option<&str> {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    };
    let has_flag = |flag: &str| args.iter().any(|arg| arg == flag);

    if has_flag("-h") || args.len() < 3 {
        usage(&args[0]);
        return Ok(());
    }

    let decode = has_flag("-d");
    let budget: Option<usize> = find_arg_value("-c").and_then(|s| s.parse().ok());
    let levels: usize = find_arg_value("-l").and_then(|s| s.parse().ok()).unwrap_or(5);
    let mode = ColorMode::from_bits(find_arg_value("-m").and_then(|s| s.parse().ok()).unwrap_or(1));
    let order = ScanOrder::from_bits(find_arg_value("-o").and_then(|s| s.parse().ok()).unwrap_or(1));
    let subsampling = has_flag("-s");

    let input = &args[args.len() - 2];
    let output = &args[args.len() - 1];
    if !Path::new(input).exists() {
        eprintln!("Error: input file not found at '{input}'");
        return Ok(());
    }

    if decode {
        let stream = std::fs::read(input)?;
        let info = sqz::probe(&stream)?;
        let mut pixels = vec![0u8; info.pixel_len()];
        sqz::decode(&stream, &mut pixels)?;
        println!(
            "Decoded {}x{} {:?} from {} bytes",
            info.width,
            info.height,
            info.color_mode,
            stream.len()
        );
        match info.color_mode {
            ColorMode::Grayscale => {
                let img =
                    image::GrayImage::from_raw(info.width as u32, info.height as u32, pixels)
                        .expect("pixel buffer matches dimensions");
                img.save(output)?;
            }
            _ => {
                let img = image::RgbImage::from_raw(info.width as u32, info.height as u32, pixels)
                    .expect("pixel buffer matches dimensions");
                img.save(output)?;
            }
        }
    } else {
        let img = image::open(input)?;
        let (pixels, width, height) = match mode {
            ColorMode::Grayscale => {
                let buf = img.to_luma8();
                let (w, h) = buf.dimensions();
                (buf.into_raw(), w as usize, h as usize)
            }
            _ => {
                let buf = img.to_rgb8();
                let (w, h) = buf.dimensions();
                (buf.into_raw(), w as usize, h as usize)
            }
        };
        let mut descriptor = ImageDescriptor {
            color_mode: mode,
            scan_order: order,
            width,
            height,
            dwt_levels: levels,
            subsampling,
        };
        // a budget of twice the raw size always fits the lossless stream
        let cap = budget.unwrap_or(width * height * mode.planes() * 2);
        let mut stream = vec![0u8; cap];
        let written = sqz::encode(&pixels, &mut stream, &mut descriptor)?;
        stream.truncate(written);
        std::fs::write(output, &stream)?;
        println!(
            "Encoded {}x{} as {:?}/{:?} levels={} into {} bytes",
            width, height, descriptor.color_mode, descriptor.scan_order, descriptor.dwt_levels, written
        );
    }

    Ok(())
}
