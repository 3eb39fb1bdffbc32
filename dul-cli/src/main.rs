//! Command line diff and patch for XML documents.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use xml_dul::xml::{parse_file, XmlPrinter};
use xml_dul::{DiffOptions, EditScript};

/// XML Tree Differencing and Patching Tool
#[derive(Parser)]
#[command(name = "dul")]
#[command(version)]
#[command(about = "XML tree differencing and patching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two XML documents and output a DUL delta
    #[command(visible_alias = "d")]
    Diff {
        /// Original file
        file1: String,
        /// Modified file
        file2: String,
        /// Output file (default: stdout)
        output: Option<String>,

        /// Report only whether the documents differ
        #[arg(short = 'q', long)]
        brief: bool,
        /// Ignore all whitespace when comparing text
        #[arg(short = 'w', long)]
        ignore_all_whitespace: bool,
        /// Ignore leading and trailing whitespace when comparing text
        #[arg(short = 'b', long)]
        ignore_leading_whitespace: bool,
        /// Ignore whitespace-only text nodes
        #[arg(short = 'e', long)]
        ignore_whitespace_nodes: bool,
        /// Compare text case insensitively
        #[arg(short = 'i', long)]
        ignore_case: bool,
        /// Ignore comments
        #[arg(short = 'r', long)]
        ignore_comments: bool,
        /// Ignore processing instructions
        #[arg(short = 'I', long)]
        ignore_processing_instructions: bool,
        /// Record context sizing attributes on the delta
        #[arg(short = 'C', long)]
        context: bool,
        /// Number of sibling context nodes
        #[arg(long, default_value = "2")]
        sibling_context: u32,
        /// Number of parent context levels
        #[arg(long, default_value = "1")]
        parent_context: u32,
        /// Number of parent sibling context nodes
        #[arg(long, default_value = "0")]
        parent_sibling_context: u32,
        /// Mark the delta as reversible
        #[arg(long)]
        reverse_patch: bool,
    },

    /// Apply a DUL delta to an XML document
    #[command(visible_alias = "p")]
    Patch {
        /// Document to patch
        file: String,
        /// Delta file
        delta: String,
        /// Output file (default: stdout)
        output: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff {
            file1,
            file2,
            output,
            brief,
            ignore_all_whitespace,
            ignore_leading_whitespace,
            ignore_whitespace_nodes,
            ignore_case,
            ignore_comments,
            ignore_processing_instructions,
            context,
            sibling_context,
            parent_context,
            parent_sibling_context,
            reverse_patch,
        } => {
            let options = DiffOptions {
                ignore_all_whitespace,
                ignore_leading_whitespace,
                ignore_whitespace_nodes,
                ignore_case,
                ignore_comments,
                ignore_processing_instructions,
                context,
                sibling_context,
                parent_context,
                parent_sibling_context,
                reverse_patch,
                ..DiffOptions::default()
            };
            run_diff(&file1, &file2, output.as_deref(), brief, &options)
        }
        Commands::Patch {
            file,
            delta,
            output,
        } => run_patch(&file, &delta, output.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Diffs two files. Exits 0 when the documents are identical and 1
/// when they differ.
fn run_diff(
    path1: &str,
    path2: &str,
    output_path: Option<&str>,
    brief: bool,
    options: &DiffOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let script = xml_dul::fmes::diff_files(path1, path2, options)?;

    if script.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    if brief {
        println!("XML documents {} and {} differ", path1, path2);
        return Ok(ExitCode::from(1));
    }

    let mut output = open_output(output_path)?;
    writeln!(output, "{}", script.to_xml())?;
    Ok(ExitCode::from(1))
}

/// Applies a delta to a file and writes the patched document.
fn run_patch(
    doc_path: &str,
    delta_path: &str,
    output_path: Option<&str>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let doc = parse_file(doc_path)?;
    let delta = std::fs::read_to_string(delta_path)?;
    let script = EditScript::from_xml(&delta)?;
    xml_dul::patch(&doc, &script)?;

    let mut output = open_output(output_path)?;
    XmlPrinter::new(&mut output).print(&doc)?;
    writeln!(output)?;
    Ok(ExitCode::SUCCESS)
}

fn open_output(path: Option<&str>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    })
}
