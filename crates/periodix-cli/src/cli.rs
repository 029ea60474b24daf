use clap::{Args, Parser, Subcommand, ValueEnum};
use periodix::workflows::crystal::Prototype;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "periodix CLI - Build periodic crystal configurations, export them as structured cell models and inspect their neighbor shells.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a prototype crystal and write its cell model as TOML.
    Model(ModelArgs),
    /// Build a prototype crystal and report neighbor coordination statistics.
    Neighbors(NeighborsArgs),
}

/// Crystal prototypes selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrototypeArg {
    /// Simple cubic
    Sc,
    /// Body-centered cubic
    Bcc,
    /// Face-centered cubic
    Fcc,
    /// CsCl-type ordered bcc
    B2,
    /// Cu3Au-type ordered fcc
    L12,
}

impl From<PrototypeArg> for Prototype {
    fn from(arg: PrototypeArg) -> Self {
        match arg {
            PrototypeArg::Sc => Prototype::SimpleCubic,
            PrototypeArg::Bcc => Prototype::BodyCentered,
            PrototypeArg::Fcc => Prototype::FaceCentered,
            PrototypeArg::B2 => Prototype::B2,
            PrototypeArg::L12 => Prototype::L12,
        }
    }
}

/// Crystal construction arguments shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CrystalArgs {
    /// The crystal prototype to build.
    #[arg(short, long, value_enum, value_name = "NAME")]
    pub prototype: PrototypeArg,

    /// Unit cell edge length a, in angstrom.
    #[arg(short, value_name = "FLOAT")]
    pub a: f64,

    /// Unit cell edge length b, in angstrom. Defaults to a.
    #[arg(short, value_name = "FLOAT")]
    pub b: Option<f64>,

    /// Unit cell edge length c, in angstrom. Defaults to a.
    #[arg(short, value_name = "FLOAT")]
    pub c: Option<f64>,

    /// Number of unit cells along each axis.
    #[arg(
        short,
        long,
        num_args = 3,
        value_names = ["NX", "NY", "NZ"],
        default_values_t = [1, 1, 1]
    )]
    pub repeat: Vec<usize>,
}

impl CrystalArgs {
    pub fn lengths(&self) -> [f64; 3] {
        [self.a, self.b.unwrap_or(self.a), self.c.unwrap_or(self.a)]
    }
}

/// Arguments for the `model` subcommand.
#[derive(Args, Debug)]
pub struct ModelArgs {
    #[command(flatten)]
    pub crystal: CrystalArgs,

    /// Path to a model export configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path for the output TOML document. Defaults to standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the element symbols, one per atom type (e.g., Cu,Au).
    #[arg(short, long, value_delimiter = ',', value_name = "SYMBOLS")]
    pub symbols: Option<Vec<String>>,

    /// Override the length unit of the box dimensions.
    #[arg(long, value_name = "UNIT")]
    pub box_unit: Option<String>,

    /// Override the position unit: 'scaled' or a length unit.
    #[arg(long, value_name = "UNIT")]
    pub position_unit: Option<String>,

    /// Export an extra per-atom property, optionally converted to a unit.
    /// Can be used multiple times. Example: --property charge:e
    #[arg(long = "property", value_name = "NAME[:UNIT]")]
    pub properties: Vec<String>,
}

/// Arguments for the `neighbors` subcommand.
#[derive(Args, Debug)]
pub struct NeighborsArgs {
    #[command(flatten)]
    pub crystal: CrystalArgs,

    /// Radial neighbor cutoff, in angstrom.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: f64,

    /// Binning granularity multiplier.
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub cmult: usize,
}
