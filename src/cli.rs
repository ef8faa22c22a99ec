use clap::*;

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_RADII: [&str; 3] = ["10", "30", "50"];
const DEFAULT_LAT: &str = "6.6198218";
const DEFAULT_LON: &str = "100.0785343";
const DEFAULT_THREADS: &str = "3";

const MODEL_OPTIONS: &'static str = "Model options:
   -m, --model-dir <PATH>                Directory holding one model per radius, named
                                         kmeans_<radius>km_model.onnx [default: models]
   -r, --radii <INT> ..                  Radii in km to classify at, comma or space
                                         separated [default: 10,30,50]
   -c, --config <PATH>                   YAML file providing any of model_dir, radii,
                                         point (lat, lon), threads and keep_going.
                                         Options given on the command line take
                                         precedence over the file.
   -t, --threads <INT>                   Number of models to run at once. 1 runs
                                         them one after another [default: 3]";

pub fn classify_full_help() -> &'static str {
    lazy_static! {
        static ref CLASSIFY_HELP: String = format!(
    "geocluster classify: Assign a point to a cluster under each radius model

{}

Point (optional):
   --lat <FLOAT>                         Latitude of the point [default: {}]
   --lon <FLOAT>                         Longitude of the point [default: {}]

Other arguments (optional):
   --keep-going                          Classify every radius even if one fails and
                                         print the successful ones. The run still
                                         exits with an error. By default the first
                                         failure aborts the run and nothing is printed.
   --fail-fast                           Abort on the first failure even when the
                                         config file sets keep_going
   -v, --verbose                         Print extra debugging information
   -q, --quiet                           Unless there is an error, do not print
                                         log messages

Example:

  geocluster classify --model-dir models/ --radii 10,30,50 --lat 6.6198218 --lon 100.0785343
", MODEL_OPTIONS, DEFAULT_LAT, DEFAULT_LON);
    }
    &CLASSIFY_HELP
}

pub fn check_full_help() -> &'static str {
    lazy_static! {
        static ref CHECK_HELP: String = format!(
    "geocluster check: Load every configured model and report its inputs and outputs

{}

Other arguments (optional):
   -v, --verbose                         Print extra debugging information
   -q, --quiet                           Unless there is an error, do not print
                                         log messages

Example:

  geocluster check --model-dir models/ --radii 10,30,50
", MODEL_OPTIONS);
    }
    &CHECK_HELP
}

fn model_args() -> Vec<Arg> {
    vec![
        Arg::new("model-dir")
            .short('m')
            .long("model-dir")
            .default_value(DEFAULT_MODEL_DIR),
        Arg::new("radii")
            .short('r')
            .long("radii")
            .num_args(1..)
            .value_delimiter(',')
            .value_parser(value_parser!(u32).range(1..))
            .default_values(DEFAULT_RADII),
        Arg::new("config")
            .short('c')
            .long("config"),
        Arg::new("threads")
            .short('t')
            .long("threads")
            .value_parser(value_parser!(usize))
            .default_value(DEFAULT_THREADS),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue),
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue),
    ]
}

pub fn build_cli() -> Command {
    Command::new("geocluster")
        .version(crate_version!())
        .author(crate::AUTHOR_AND_EMAIL)
        .about("Assign coordinates to spatial clusters with per-radius k-means models")
        .override_help(
            "
Spatial cluster assignment using pre-trained k-means ONNX models
Usage: geocluster <subcommand> ...
Main subcommands:
\tclassify \tAssign a point to a cluster under the model for each radius
\tcheck    \tLoad every model and report its signature
Other options:
\t-V, --version\tPrint version information
",
        )
        .arg_required_else_help(true)
        .subcommand(
            Command::new("classify")
                .about("Assign a point to a cluster under the model for each radius")
                .override_help(classify_full_help())
                .args(model_args())
                .arg(
                    Arg::new("lat")
                        .long("lat")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f32))
                        .default_value(DEFAULT_LAT),
                )
                .arg(
                    Arg::new("lon")
                        .long("lon")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f32))
                        .default_value(DEFAULT_LON),
                )
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("fail-fast")
                        .long("fail-fast")
                        .conflicts_with("keep-going")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Load every model and report its inputs and outputs")
                .override_help(check_full_help())
                .args(model_args()),
        )
}
