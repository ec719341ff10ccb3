//! Renders the rasterizer test scenarios to binary PPM images

use std::{
    f64::consts::{PI, TAU},
    fs, io,
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use math::Color;
use render::{
    Antialias, Context, Extend, FillRule, Format, LineCap, LineJoin, Operator, Options, Pattern,
    Surface,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Even-odd fill of a doubled rectangle with `in`, over magenta
    EvenOddIn,

    /// Two disjoint diamonds clipped in sequence, then paint
    DisjointDiamonds,

    /// An arc with an enormous sweep
    HugeArc,

    /// Dashed strokes with every cap and join style
    Strokes,

    /// Linear and radial gradients with all extend modes
    Gradients,

    /// A surface painted onto itself
    SelfPaint,

    /// Every operator applied to the same pair of shapes
    Operators,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum AntialiasArgument {
    #[default]
    Default,
    None,
    Gray,
}

impl From<AntialiasArgument> for Antialias {
    fn from(value: AntialiasArgument) -> Self {
        match value {
            AntialiasArgument::Default => Self::Default,
            AntialiasArgument::None => Self::None,
            AntialiasArgument::Gray => Self::Gray,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Where to write the image, stdout if omitted
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// The scenario to render
    #[arg(short = 's', long = "scenario", value_enum)]
    scenario: Scenario,

    #[arg(long = "width", default_value_t = 60)]
    width: usize,

    #[arg(long = "height", default_value_t = 60)]
    height: usize,

    #[arg(long = "antialias", value_enum, default_value_t = AntialiasArgument::Default)]
    antialias: AntialiasArgument,

    /// Maximum error when approximating curves, in pixels
    #[arg(long = "tolerance", default_value_t = 0.1)]
    tolerance: f64,
}

#[derive(Debug)]
// Dead code analysis ignores debug impls (which are called when the error is returned from main)
#[allow(dead_code)]
enum Error {
    IO(io::Error),
    Render(render::Error),
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Arguments::parse();
    let options = Options {
        tolerance: args.tolerance,
        antialias: args.antialias.into(),
        ..Options::default()
    };

    let surface = Surface::new(Format::Argb32, args.width, args.height);
    surface.status().map_err(Error::Render)?;

    log::info!(
        "Rendering {:?} at {}x{}",
        args.scenario,
        args.width,
        args.height
    );

    let mut context = Context::with_options(&surface, options);
    let (width, height) = (args.width as f64, args.height as f64);
    match args.scenario {
        Scenario::EvenOddIn => even_odd_in(&mut context, width, height),
        Scenario::DisjointDiamonds => disjoint_diamonds(&mut context, width, height),
        Scenario::HugeArc => huge_arc(&mut context, width, height),
        Scenario::Strokes => strokes(&mut context, width, height),
        Scenario::Gradients => gradients(&mut context, width, height),
        Scenario::SelfPaint => self_paint(&mut context, width, height),
        Scenario::Operators => operators(&mut context, width, height),
    }
    context.status().map_err(Error::Render)?;
    surface.flush().map_err(Error::Render)?;
    surface.finish();

    match args.output {
        Some(path) => {
            let file = fs::File::create(&path).map_err(Error::IO)?;
            surface.write_ppm(io::BufWriter::new(file)).map_err(Error::IO)?;
            log::info!("Wrote {}", path.display());
        },
        None => surface.write_ppm(io::stdout().lock()).map_err(Error::IO)?,
    }

    Ok(())
}

fn even_odd_in(context: &mut Context, width: f64, height: f64) {
    context.set_source(&Pattern::solid(Color::MAGENTA));
    context.paint();

    context.push_group();
    context.set_operator(Operator::In);
    context.set_fill_rule(FillRule::EvenOdd);
    context.set_source_rgb(1., 1., 1.);
    context.rectangle(0., 0., width, height);
    context.rectangle(0., 0., width, height);
    context.fill();
    context.pop_group_to_source();
    context.paint();
}

fn disjoint_diamonds(context: &mut Context, width: f64, height: f64) {
    context.set_source(&Pattern::solid(Color::WHITE));
    context.paint();

    let radius = width.min(height) / 3.;
    let centers = [
        (radius, radius),
        (width - radius * 0.4, radius * 1.6),
    ];
    for (x, y) in centers {
        context.move_to(x, y - radius);
        context.line_to(x + radius, y);
        context.line_to(x, y + radius);
        context.line_to(x - radius, y);
        context.close_path();
        context.clip();
    }

    context.set_source_rgb(0., 0., 0.);
    context.paint();
}

fn huge_arc(context: &mut Context, width: f64, height: f64) {
    context.set_source(&Pattern::solid(Color::WHITE));
    context.paint();

    context.set_source_rgb(0., 0., 1.);
    context.arc(
        width / 2.,
        height / 2.,
        width.min(height) / 3.,
        0.,
        1024. / f64::EPSILON * PI,
    );
    context.stroke();
}

fn strokes(context: &mut Context, width: f64, height: f64) {
    context.set_source(&Pattern::solid(Color::WHITE));
    context.paint();
    context.set_source_rgb(0., 0., 0.);
    context.set_line_width(height / 12.);

    let styles = [
        (LineCap::Butt, LineJoin::Miter),
        (LineCap::Round, LineJoin::Round),
        (LineCap::Square, LineJoin::Bevel),
    ];
    let column = width / styles.len() as f64;
    for (index, (cap, join)) in styles.into_iter().enumerate() {
        let left = column * index as f64 + column * 0.2;
        let right = left + column * 0.6;

        context.set_line_cap(cap);
        context.set_line_join(join);
        context.set_dash(&[], 0.);
        context.move_to(left, height * 0.45);
        context.line_to((left + right) / 2., height * 0.1);
        context.line_to(right, height * 0.45);
        context.stroke();

        context.set_dash(&[height / 10., height / 20., 0., height / 20.], 0.);
        context.move_to(left, height * 0.6);
        context.line_to(right, height * 0.9);
        context.stroke();
    }
}

fn gradients(context: &mut Context, width: f64, height: f64) {
    let extends = [Extend::None, Extend::Pad, Extend::Repeat, Extend::Reflect];
    let column = width / extends.len() as f64;

    for (index, extend) in extends.into_iter().enumerate() {
        let left = column * index as f64;
        let center = left + column / 2.;

        let mut linear = Pattern::linear(center - column / 6., 0., center + column / 6., 0.);
        linear.add_color_stop(0., Color::RED);
        linear.add_color_stop(0.5, Color::GREEN);
        linear.add_color_stop(1., Color::BLUE);
        linear.set_extend(extend);
        context.set_source(&linear);
        context.rectangle(left, 0., column, height / 2.);
        context.fill();

        let radius = column / 3.;
        let mut radial = Pattern::radial(
            center,
            height * 0.75,
            radius / 4.,
            center,
            height * 0.75,
            radius,
        );
        radial.add_color_stop(0., Color::WHITE);
        radial.add_color_stop(1., Color::rgba(0., 0., 0., 0.5));
        radial.set_extend(extend);
        context.set_source(&radial);
        context.rectangle(left, height / 2., column, height / 2.);
        context.fill();
    }
}

fn self_paint(context: &mut Context, width: f64, height: f64) {
    context.set_source_rgb(1., 0., 0.);
    context.arc(width / 4., height / 2., width.min(height) / 5., 0., TAU);
    context.fill();

    let target = context.target().clone();
    context.set_source_surface(&target, width / 2., 0.);
    context.paint_with_alpha(0.5);
}

fn operators(context: &mut Context, width: f64, height: f64) {
    let operators = [
        Operator::Clear,
        Operator::Source,
        Operator::Over,
        Operator::In,
        Operator::Out,
        Operator::Atop,
        Operator::Dest,
        Operator::DestOver,
        Operator::DestIn,
        Operator::DestOut,
        Operator::DestAtop,
        Operator::Xor,
        Operator::Add,
        Operator::Saturate,
        Operator::Multiply,
        Operator::Screen,
        Operator::Overlay,
        Operator::Darken,
        Operator::Lighten,
        Operator::ColorDodge,
        Operator::ColorBurn,
        Operator::HardLight,
        Operator::SoftLight,
        Operator::Difference,
        Operator::Exclusion,
        Operator::HslHue,
        Operator::HslSaturation,
        Operator::HslColor,
        Operator::HslLuminosity,
    ];

    let columns = 6;
    let rows = operators.len().div_ceil(columns);
    let cell_width = width / columns as f64;
    let cell_height = height / rows as f64;

    for (index, operator) in operators.into_iter().enumerate() {
        let x = (index % columns) as f64 * cell_width;
        let y = (index / columns) as f64 * cell_height;

        context.save();
        context.rectangle(x, y, cell_width, cell_height);
        context.clip();

        context.set_operator(Operator::Over);
        context.set_source_rgba(0., 0., 0.9, 0.8);
        context.rectangle(x, y, cell_width * 0.6, cell_height * 0.6);
        context.fill();

        context.set_operator(operator);
        context.set_source_rgba(0.9, 0.1, 0., 0.6);
        context.arc(
            x + cell_width * 0.6,
            y + cell_height * 0.6,
            cell_width.min(cell_height) * 0.35,
            0.,
            TAU,
        );
        context.fill();
        context.restore();
    }
}
