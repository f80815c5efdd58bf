use std::env;
use std::fs;
use std::path::Path;
use std::process;

use stup::{color, filters, jpeg, pgm, PixelFormat};

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  stup encode <input.jpg|input.pgm> <output.stup> [filter...]");
    eprintln!("  stup decode <input.stup> <output.jpg|output.pgm> [quality]");
    eprintln!();
    eprintln!("Filters (applied in order before encoding):");
    eprintln!("  --contrast <gain>:<bias>   contrast/brightness adjustment");
    eprintln!("  --threshold <value>        binarize");
    eprintln!("  --invert                   invert all channels");
    eprintln!("  --edges                    edge magnitude (grayscale input only)");
    eprintln!("  --blur <radius>            box blur (grayscale input only)");
    eprintln!("  --selective-blur <r>:<g>:<b>  content-adaptive blur (grayscale only)");
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}

fn load_input(path: &str) -> stup::Result<stup::Image> {
    if path.ends_with(".pgm") {
        Ok(pgm::Pgm::open(path)?.into_image())
    } else {
        jpeg::load_jpeg(path)
    }
}

fn apply_filters(img: &mut stup::Image, args: &[String]) -> stup::Result<()> {
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--contrast" => {
                let (gain, bias) = parse_pair(args.get(i + 1));
                filters::contrast_brightness(img, gain, bias as i16);
                i += 2;
            }
            "--threshold" => {
                let value = parse_num(args.get(i + 1)) as u8;
                filters::threshold(img, value);
                i += 2;
            }
            "--invert" => {
                filters::invert(img);
                i += 1;
            }
            "--edges" => {
                filters::edge_filter(img)?;
                i += 1;
            }
            "--blur" => {
                let radius = parse_num(args.get(i + 1)) as u8;
                filters::box_blur(img, radius)?;
                i += 2;
            }
            "--selective-blur" => {
                let parts = parse_triple(args.get(i + 1));
                filters::selective_blur(img, parts.0, parts.1, parts.2)?;
                i += 2;
            }
            other => fail(&format!("unknown filter option: {other}")),
        }
    }
    Ok(())
}

fn parse_num(arg: Option<&String>) -> f32 {
    arg.and_then(|s| s.parse().ok())
        .unwrap_or_else(|| fail("expected a numeric filter argument"))
}

fn parse_pair(arg: Option<&String>) -> (f32, f32) {
    let parts: Vec<f32> = arg
        .map(|s| s.split(':').filter_map(|p| p.parse().ok()).collect())
        .unwrap_or_default();
    if parts.len() != 2 {
        fail("expected <a>:<b>");
    }
    (parts[0], parts[1])
}

fn parse_triple(arg: Option<&String>) -> (f32, f32, f32) {
    let parts: Vec<f32> = arg
        .map(|s| s.split(':').filter_map(|p| p.parse().ok()).collect())
        .unwrap_or_default();
    if parts.len() != 3 {
        fail("expected <a>:<b>:<c>");
    }
    (parts[0], parts[1], parts[2])
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    let input_path = &args[2];
    let output_path = &args[3];

    if let Some(parent) = Path::new(output_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                fail(&format!("creating output directory: {e}"));
            });
        }
    }

    match command.as_str() {
        "encode" => {
            let mut img = load_input(input_path)
                .unwrap_or_else(|e| fail(&format!("reading {input_path}: {e}")));
            apply_filters(&mut img, &args[4..])
                .unwrap_or_else(|e| fail(&format!("applying filters: {e}")));
            let mut out = std::io::BufWriter::new(
                fs::File::create(output_path)
                    .unwrap_or_else(|e| fail(&format!("creating {output_path}: {e}"))),
            );
            if let Err(e) = stup::encode(&img, &mut out) {
                fail(&format!("encoding: {e}"));
            }
        }
        "decode" => {
            let mut reader = std::io::BufReader::new(
                fs::File::open(input_path)
                    .unwrap_or_else(|e| fail(&format!("opening {input_path}: {e}"))),
            );
            let img = stup::decode(&mut reader)
                .unwrap_or_else(|e| fail(&format!("decoding {input_path}: {e}")));
            let result = if output_path.ends_with(".pgm") {
                let gray = color::convert(&img, PixelFormat::Gray);
                pgm::Pgm::from_image(&gray).and_then(|p| p.save(output_path))
            } else {
                let quality = match args.get(4) {
                    Some(q) => q
                        .parse()
                        .unwrap_or_else(|_| fail("quality must be 1-100")),
                    None => jpeg::DEFAULT_QUALITY,
                };
                let rgb = color::convert(&img, PixelFormat::Rgb);
                jpeg::save_jpeg(&rgb, output_path, quality)
            };
            if let Err(e) = result {
                fail(&format!("writing {output_path}: {e}"));
            }
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}
