// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use failure::{err_msg, Error};
use num::Complex;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use escapetime::output::write_image;
use escapetime::palette::DEFAULT_RANDOM_STOPS;
use escapetime::{
    ColorTable, Family, FixedPalette, GradientProfile, IndexMapper, Kind, PaletteSource,
    RandomPalette, RenderSettings, Renderer, Sequence,
};

// "800x600" with 'x', "-0.7,0.2" with ','.  Both halves must parse.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let mut halves = s.splitn(2, separator);
    let first = halves.next()?.parse().ok()?;
    let second = halves.next()?.parse().ok()?;
    Some((first, second))
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex::new(re, im))
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    parse_pair::<T>(s, separator).map(|_| ()).ok_or_else(|| err.to_string())
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    unparsable: &str,
    out_of_range: &str,
) -> Result<(), String> {
    let value = s.parse::<T>().map_err(|_| unparsable.to_string())?;
    // Written so NaN falls outside every range.
    if value >= low && value <= high {
        Ok(())
    } else {
        Err(out_of_range.to_string())
    }
}

fn validate_parse<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    s.parse::<T>().map(|_| ()).map_err(|_| err.to_string())
}

const MANDELBROT: &str = "mandelbrot";
const JULIA: &str = "julia";
const SEQUENCE: &str = "sequence";

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const WIDTH: &str = "width";
const ITERATIONS: &str = "iterations";
const DENSITY: &str = "density";
const ROTATION: &str = "rotation";
const MAPPING: &str = "mapping";
const FAMILY: &str = "family";
const GRADIENT: &str = "gradient";
const SEED: &str = "seed";
const STOPS: &str = "stops";
const THREADS: &str = "threads";
const PARAMETER: &str = "parameter";
const DIR: &str = "dir";
const FRAMES: &str = "frames";
const START: &str = "start";

// Arguments every subcommand takes.  Size, center, width and
// iterations have no clap defaults because they differ between the
// Mandelbrot and Julia renders.
fn render_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    let max_threads = num_cpus::get();

    vec![
        Arg::with_name(SIZE)
            .long(SIZE)
            .short("s")
            .takes_value(true)
            .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
            .help("Size of output image, WIDTHxHEIGHT"),
        Arg::with_name(CENTER)
            .long(CENTER)
            .takes_value(true)
            .allow_hyphen_values(true)
            .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse the center point"))
            .help("Center of the view on the complex plane, RE,IM"),
        Arg::with_name(WIDTH)
            .long(WIDTH)
            .short("w")
            .takes_value(true)
            .validator(|s| {
                validate_range(
                    &s,
                    std::f64::MIN_POSITIVE,
                    std::f64::MAX,
                    "Could not parse view width",
                    "View width must be positive",
                )
            })
            .help("Width of the view along the real axis"),
        Arg::with_name(ITERATIONS)
            .long(ITERATIONS)
            .short("i")
            .takes_value(true)
            .validator(|s| {
                validate_range(
                    &s,
                    1,
                    10_000_000,
                    "Could not parse iteration count",
                    "Iteration count must be between 1 and 10000000",
                )
            })
            .help("Maximum number of iterations per pixel"),
        Arg::with_name(DENSITY)
            .long(DENSITY)
            .short("d")
            .takes_value(true)
            .default_value("1")
            .validator(|s| {
                validate_range(
                    &s,
                    std::f64::MIN_POSITIVE,
                    std::f64::MAX,
                    "Could not parse color density",
                    "Color density must be positive",
                )
            })
            .help("Color table steps per iteration"),
        Arg::with_name(ROTATION)
            .long(ROTATION)
            .short("r")
            .takes_value(true)
            .allow_hyphen_values(true)
            .default_value("0")
            .validator(|s| validate_parse::<i64>(&s, "Could not parse palette rotation"))
            .help("Offset added to every color table index"),
        Arg::with_name(MAPPING)
            .long(MAPPING)
            .short("m")
            .takes_value(true)
            .possible_values(&["linear", "log", "logarithmic"])
            .default_value("linear")
            .help("How escape counts map onto the color table"),
        Arg::with_name(FAMILY)
            .long(FAMILY)
            .short("f")
            .takes_value(true)
            .possible_values(&["quadratic", "cubic", "tricorn", "burning-ship"])
            .default_value("quadratic")
            .help("The recurrence to iterate"),
        Arg::with_name(GRADIENT)
            .long(GRADIENT)
            .short("g")
            .takes_value(true)
            .help("JSON gradient profile; a random palette is used without one"),
        Arg::with_name(SEED)
            .long(SEED)
            .takes_value(true)
            .conflicts_with(GRADIENT)
            .validator(|s| validate_parse::<u64>(&s, "Could not parse random seed"))
            .help("Seed for the random palette"),
        Arg::with_name(STOPS)
            .long(STOPS)
            .takes_value(true)
            .conflicts_with(GRADIENT)
            .validator(|s| {
                validate_range(
                    &s,
                    2,
                    1_000_000,
                    "Could not parse stop count",
                    "Random palettes need between 2 and 1000000 stops",
                )
            })
            .help("Number of color stops in the random palette [default: 400]"),
        Arg::with_name(THREADS)
            .long(THREADS)
            .short("t")
            .takes_value(true)
            .validator(move |s| {
                validate_range(
                    &s,
                    1,
                    max_threads,
                    "Could not parse thread count",
                    &format!("Thread count must be between 1 and {}", max_threads),
                )
            })
            .help("Number of threads to use in the renderer"),
    ]
}

fn output_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(OUTPUT)
        .required(true)
        .long(OUTPUT)
        .short("o")
        .takes_value(true)
        .help("Output file; the extension picks the format")
}

fn args<'a>() -> ArgMatches<'a> {
    App::new("fractal")
        .version("0.1.0")
        .about("Escape-time Mandelbrot and Julia renderer")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name(MANDELBROT)
                .about("Render a view of the Mandelbrot set")
                .arg(output_arg())
                .args(&render_args()),
        )
        .subcommand(
            SubCommand::with_name(JULIA)
                .about("Render a view of a Julia set")
                .arg(output_arg())
                .args(&render_args())
                .arg(
                    Arg::with_name(PARAMETER)
                        .long("c")
                        .short("c")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .default_value("-0.4,0.6")
                        .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse Julia parameter"))
                        .help("The fixed parameter c of the Julia set, RE,IM"),
                ),
        )
        .subcommand(
            SubCommand::with_name(SEQUENCE)
                .about("Render the numbered zoom sequence into a directory")
                .args(&render_args())
                .arg(
                    Arg::with_name(DIR)
                        .long(DIR)
                        .takes_value(true)
                        .default_value("img")
                        .help("Directory the frames are written to"),
                )
                .arg(
                    Arg::with_name(FRAMES)
                        .long(FRAMES)
                        .takes_value(true)
                        .validator(|s| validate_parse::<usize>(&s, "Could not parse frame count"))
                        .help("Frames per shot, overriding the built-in counts"),
                )
                .arg(
                    Arg::with_name(START)
                        .long(START)
                        .takes_value(true)
                        .default_value("1")
                        .validator(|s| validate_parse::<usize>(&s, "Could not parse first frame number"))
                        .help("Number of the first frame"),
                ),
        )
        .get_matches()
}

// Validators have already run, so a value that fails to parse here
// means the argument was absent.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).and_then(|s| T::from_str(s).ok())
}

fn settings(matches: &ArgMatches, base: RenderSettings, kind: Kind) -> Result<(RenderSettings, Family), Error> {
    let mut settings = base;
    if let Some(size) = matches.value_of(SIZE) {
        let (w, h) = parse_pair::<usize>(size, 'x').ok_or_else(|| err_msg("Error parsing image dimensions"))?;
        settings.viewport.image_width = w;
        settings.viewport.image_height = h;
    }
    if let Some(center) = matches.value_of(CENTER) {
        settings.viewport.center = parse_complex(center).ok_or_else(|| err_msg("Error parsing center point"))?;
    }
    if let Some(width) = value(matches, WIDTH) {
        settings.viewport.width_span = width;
    }
    if let Some(iterations) = value(matches, ITERATIONS) {
        settings.max_iterations = iterations;
    }
    settings.density = value(matches, DENSITY).unwrap_or(1.0);
    settings.rotation = value(matches, ROTATION).unwrap_or(0);
    settings.mapper = value(matches, MAPPING).unwrap_or(IndexMapper::Linear);
    let family = value(matches, FAMILY).unwrap_or(Family::Quadratic);
    settings.interior_check = kind == Kind::Mandelbrot && family.has_known_interior();
    settings.validate()?;
    Ok((settings, family))
}

fn palette(matches: &ArgMatches) -> Result<Box<dyn PaletteSource>, Error> {
    if let Some(path) = matches.value_of(GRADIENT) {
        let profile = GradientProfile::from_reader(File::open(path)?)?;
        return Ok(Box::new(FixedPalette(profile)));
    }
    let stops = value(matches, STOPS).unwrap_or(DEFAULT_RANDOM_STOPS);
    Ok(match value::<u64>(matches, SEED) {
        Some(seed) => Box::new(RandomPalette::seeded(seed, stops)),
        None => Box::new(RandomPalette::from_entropy(stops)),
    })
}

fn threads(matches: &ArgMatches) -> usize {
    value(matches, THREADS).unwrap_or_else(num_cpus::get)
}

fn render_one(matches: &ArgMatches, base: RenderSettings, kind: Kind) -> Result<(), Error> {
    let (settings, family) = settings(matches, base, kind)?;
    let table = ColorTable::build(&palette(matches)?.profile()?)?;
    let renderer = Renderer::new(settings, kind, &table, move |z: Complex<f64>, c: Complex<f64>| family.apply(z, c))?;
    let pixels = renderer.render_threaded(threads(matches))?;

    let outfile = matches.value_of(OUTPUT).ok_or_else(|| err_msg("No output file given"))?;
    let vp = settings.viewport;
    write_image(Path::new(outfile), vp.image_width, vp.image_height, &pixels)?;
    info!(path = outfile, "saved");
    Ok(())
}

fn render_sequence(matches: &ArgMatches) -> Result<(), Error> {
    let (settings, family) = settings(matches, RenderSettings::default(), Kind::Mandelbrot)?;
    let mut sequence = Sequence::classic(settings);
    if let Some(frames) = value(matches, FRAMES) {
        sequence = sequence.with_frames(frames);
    }
    let dir = matches.value_of(DIR).unwrap_or("img");
    let start = value(matches, START).unwrap_or(1);
    let mut source = palette(matches)?;
    let written = sequence.run(
        Path::new(dir),
        start,
        source.as_mut(),
        move |z: Complex<f64>, c: Complex<f64>| family.apply(z, c),
        threads(matches),
    )?;
    info!(frames = written, dir, "sequence complete");
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    match matches.subcommand() {
        (MANDELBROT, Some(sub)) => render_one(sub, RenderSettings::default(), Kind::Mandelbrot),
        (JULIA, Some(sub)) => {
            let c = sub
                .value_of(PARAMETER)
                .and_then(parse_complex)
                .ok_or_else(|| err_msg("Error parsing Julia parameter"))?;
            render_one(sub, RenderSettings::julia_default(), Kind::Julia(c))
        }
        (SEQUENCE, Some(sub)) => render_sequence(sub),
        _ => Err(err_msg("No subcommand given")),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
