use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use protofox::{
    compile_descriptors, compile_models, descriptors_to_client, models_to_proto, to_json,
    DescriptorSource, JsonDescriptorSource, OutputDir, Protoc,
};

#[derive(Parser)]
#[command(name = "pfox")]
#[command(about = "Translate data models to protobuf and protobuf descriptors to Rust clients", long_about = None)]
struct Cli {
    /// Log resolution steps (overridden by `RUST_LOG`)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a `.pfm` model file as `.proto` files, one per package
    Proto {
        /// Input `.pfm` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Package used when the file has no `package` line
        #[arg(short, long, default_value = "default")]
        package: String,
    },

    /// Render Rust client stubs from the compiled descriptors of a package
    Client {
        /// Package to load
        #[arg(short, long)]
        package: String,

        /// Directory holding `<package>.json` (or `<package>.bin` with `--binary`)
        #[arg(short, long, default_value = ".")]
        descriptors: PathBuf,

        /// Read a binary `FileDescriptorSet` instead of JSON
        #[arg(long)]
        binary: bool,

        /// Output `.rs` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run `protoc` on a `.proto` file or directory
    Compile {
        /// Input `.proto` file or directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for every plugin
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Plugins to run, e.g. `python`, `grpc_python`
        #[arg(long = "plugin", default_values_t = vec!["python".to_string(), "grpc_python".to_string()])]
        plugins: Vec<String>,

        /// Also write a descriptor set to this file
        #[arg(long)]
        descriptor_set: Option<PathBuf>,

        /// Extra include paths
        #[arg(short = 'I', long = "include")]
        include_paths: Vec<PathBuf>,

        /// Compiler executable
        #[arg(long, default_value = protofox::DEFAULT_PROTOC)]
        protoc: PathBuf,
    },

    /// Print the resolved schema as JSON
    Dump {
        /// Input `.pfm` file (forward direction)
        #[arg(short, long, conflicts_with = "descriptors")]
        input: Option<PathBuf>,

        /// Directory holding `<package>.json` descriptors (reverse direction)
        #[arg(short, long)]
        descriptors: Option<PathBuf>,

        /// Package to load, or the default package of a model file
        #[arg(short, long, default_value = "default")]
        package: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_models(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}

fn descriptor_source(root: PathBuf, binary: bool) -> Result<Box<dyn DescriptorSource>> {
    if !binary {
        return Ok(Box::new(JsonDescriptorSource::new(root)));
    }
    #[cfg(feature = "prost-reflect")]
    {
        Ok(Box::new(protofox::FileDescriptorSetSource::new(root)))
    }
    #[cfg(not(feature = "prost-reflect"))]
    {
        bail!("binary descriptor sets need the `prost-reflect` feature")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Proto { input, output, package } => {
            let text = read_models(&input)?;
            let protos = models_to_proto(&text, &package)?;
            if protos.is_empty() {
                bail!("{} declares no services", input.display());
            }
            match output {
                Some(dir) => {
                    fs::create_dir_all(&dir)?;
                    for (package, proto) in &protos {
                        let path = dir.join(format!("{}.proto", package));
                        fs::write(&path, proto)?;
                        println!("Wrote {}", path.display());
                    }
                }
                None => {
                    for (_, proto) in &protos {
                        print!("{}", proto);
                    }
                }
            }
            Ok(())
        }

        Commands::Client { package, descriptors, binary, output } => {
            let source = descriptor_source(descriptors, binary)?;
            let rust_code = descriptors_to_client(source.as_ref(), &package)?;
            if let Some(out_path) = output {
                fs::write(&out_path, &rust_code)?;
                println!("Client stubs written to {}", out_path.display());
            } else {
                print!("{}", rust_code);
            }
            Ok(())
        }

        Commands::Compile { input, output, plugins, descriptor_set, include_paths, protoc } => {
            let mut outputs: Vec<OutputDir> = plugins
                .iter()
                .map(|plugin| OutputDir::plugin(plugin.clone(), output.clone()))
                .collect();
            if let Some(file) = descriptor_set {
                outputs.push(OutputDir::DescriptorSet(file));
            }
            Protoc::new(protoc).compile(&input, &outputs, &include_paths)?;
            println!("Compiled {}", input.display());
            Ok(())
        }

        Commands::Dump { input, descriptors, package } => {
            let json = match (input, descriptors) {
                (Some(input), _) => to_json(&compile_models(&read_models(&input)?, &package)?)?,
                (None, Some(root)) => {
                    let tree = JsonDescriptorSource::new(root).load(&package)?;
                    to_json(&compile_descriptors(&tree)?)?
                }
                (None, None) => bail!("either --input or --descriptors is required"),
            };
            println!("{}", json);
            Ok(())
        }
    }
}
