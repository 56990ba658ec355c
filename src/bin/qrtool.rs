// Command line encode/decode tool.
//
//   qrtool encode <text> <out.png|out.svg> [ec] [scale] [border]
//   qrtool decode <image> [--try-harder] [--pure]
use image::{GrayImage, Luma};
use qr_codec::{encode_text, DecodeHints, ECLevel, Luma8Source, Symbol};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("encode") if args.len() >= 3 => encode_cmd(&args[1], Path::new(&args[2]), &args[3..]),
        Some("decode") if args.len() >= 2 => decode_cmd(Path::new(&args[1]), &args[2..]),
        _ => {
            eprintln!("usage: qrtool encode <text> <out.png|out.svg> [L|M|Q|H] [scale] [border]");
            eprintln!("       qrtool decode <image> [--try-harder] [--pure]");
            ExitCode::FAILURE
        }
    }
}

fn encode_cmd(text: &str, output: &Path, rest: &[String]) -> ExitCode {
    let ec_level = match rest.first().map(String::as_str) {
        Some("L") => ECLevel::L,
        Some("Q") => ECLevel::Q,
        Some("H") => ECLevel::H,
        Some("M") | None => ECLevel::M,
        Some(other) => {
            eprintln!("unknown EC level: {other}");
            return ExitCode::FAILURE;
        }
    };
    let scale: usize = rest.get(1).and_then(|s| s.parse().ok()).unwrap_or(8);
    let border: usize = rest.get(2).and_then(|s| s.parse().ok()).unwrap_or(4);

    let symbol = match encode_text(text, ec_level) {
        Ok(symbol) => symbol,
        Err(err) => {
            eprintln!("encode failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "version {} ({}x{} modules), EC level {:?}, mask {}",
        symbol.version().number(),
        symbol.size(),
        symbol.size(),
        symbol.ec_level(),
        symbol.mask().index()
    );

    let is_svg = output.extension().is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    let result = if is_svg {
        std::fs::write(output, symbol.to_svg_string(border))
            .map_err(|e| format!("write failed: {e}"))
    } else {
        render_png(&symbol, scale, border, output)
    };
    match result {
        Ok(()) => {
            println!("wrote {}", output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn render_png(symbol: &Symbol, scale: usize, border: usize, output: &Path) -> Result<(), String> {
    let side = ((symbol.size() + 2 * border) * scale) as u32;
    let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));
    for y in 0..symbol.size() {
        for x in 0..symbol.size() {
            if symbol.module(x, y) {
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = ((x + border) * scale + dx) as u32;
                        let py = ((y + border) * scale + dy) as u32;
                        img.put_pixel(px, py, Luma([0u8]));
                    }
                }
            }
        }
    }
    img.save(output).map_err(|e| format!("save failed: {e}"))
}

fn decode_cmd(input: &Path, rest: &[String]) -> ExitCode {
    let hints = DecodeHints {
        try_harder: rest.iter().any(|a| a == "--try-harder"),
        pure_barcode: rest.iter().any(|a| a == "--pure"),
        character_set: None,
    };

    let img = match image::open(input) {
        Ok(img) => img.to_luma8(),
        Err(err) => {
            eprintln!("failed to load {}: {err}", input.display());
            return ExitCode::FAILURE;
        }
    };
    let (width, height) = (img.width() as usize, img.height() as usize);
    let source = Luma8Source::new(img.into_raw(), width, height);

    match qr_codec::decode_with_hints(&source, &hints) {
        Ok(result) => {
            println!(
                "version {}, EC level {:?}, mask {}{}",
                result.version.number(),
                result.ec_level,
                result.mask.index(),
                if result.mirrored { ", mirrored" } else { "" }
            );
            if let Some(sa) = result.structured_append {
                println!(
                    "structured append: symbol {} of {}, parity {:#04x}",
                    (sa.sequence >> 4) + 1,
                    (sa.sequence & 0x0F) + 1,
                    sa.parity
                );
            }
            println!("{}", result.text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("decode failed: {err}");
            ExitCode::FAILURE
        }
    }
}
