#![cfg(not(tarpaulin_include))]

use clap::{Args, Parser, Subcommand};
use qrsheet::config::{
    DEFAULT_EXPORT_FILE_NAME, DEFAULT_IDENTIFIER_FIELD, MAX_CODE_SIZE, MAX_EXPORT_SCALE,
};
use qrsheet::{AppConfig, Controller, DirectorySink, SelectedFile};
use std::path::PathBuf;

/// List spreadsheet rows with one QR code each and export them as an image
#[derive(Parser, Debug)]
#[command(name = "qrsheet", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the table and save it as a PNG
    Export {
        #[command(flatten)]
        table: TableArgs,

        /// Directory the image is written to
        #[arg(short, long, env = "QRSHEET_OUTPUT", default_value = ".")]
        output_dir: PathBuf,

        /// File name of the image
        #[arg(long, default_value = DEFAULT_EXPORT_FILE_NAME)]
        file_name: String,

        /// Pixel density multiplier
        #[arg(
            long,
            default_value_t = 2,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_EXPORT_SCALE))
        )]
        scale: u32,
    },

    /// Print the table with each row's code payload
    Show {
        #[command(flatten)]
        table: TableArgs,

        /// Print JSON instead of tab-separated text
        #[arg(long)]
        json: bool,
    },

    /// Write the table as an HTML fragment with inline SVG codes
    Html {
        #[command(flatten)]
        table: TableArgs,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Spreadsheet to read (.xlsx or .xls)
    input: PathBuf,

    /// Column whose value each code encodes
    #[arg(short, long, env = "QRSHEET_FIELD", default_value = DEFAULT_IDENTIFIER_FIELD)]
    field: String,

    /// Edge length of each code in pixels
    #[arg(
        long,
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_CODE_SIZE))
    )]
    code_size: u32,
}

impl TableArgs {
    /// Builds a controller with the file loaded and the field applied
    fn load(&self, config: AppConfig) -> Result<Controller, Box<dyn std::error::Error>> {
        let mut controller = Controller::new(AppConfig {
            identifier_field: self.field.clone(),
            code_size: self.code_size,
            ..config
        });

        let file = SelectedFile::from_path(&self.input)?;
        controller.on_file_selected(file)?;
        Ok(controller)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Export {
            table,
            output_dir,
            file_name,
            scale,
        } => {
            let config = AppConfig {
                export_scale: scale,
                export_file_name: file_name,
                ..AppConfig::default()
            };
            let mut controller = table.load(config)?;

            std::fs::create_dir_all(&output_dir)?;
            let mut sink = DirectorySink::new(&output_dir);
            let image = controller.on_export(&mut sink)?;
            println!(
                "{} ({}x{} px)",
                output_dir.join(&image.file_name).display(),
                image.width,
                image.height
            );
        }
        Command::Show { table, json } => {
            let controller = table.load(AppConfig::default())?;
            let view = controller.table_view();

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                let header: Vec<&str> = view.header_labels().collect();
                println!("{}", header.join("\t"));
                for row in &view.rows {
                    println!("{}\t{}", row.cells.join("\t"), row.payload);
                }
            }
        }
        Command::Html { table, out } => {
            let controller = table.load(AppConfig::default())?;
            let html = controller.table_html();

            match out {
                Some(path) => std::fs::write(path, html)?,
                None => println!("{}", html),
            }
        }
    }

    Ok(())
}
