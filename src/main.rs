use std::{
    fs::{self, read_to_string},
    path::{Path, PathBuf},
    process::{self, Command},
    time::Instant,
};

use clap::{Parser, ValueEnum};
use log::{error, info};
use tiger::{compile, render_error, Config};

#[derive(Parser)]
#[command(name = "tigerc", version, about = "Compiles Tiger programs through LLVM")]
struct Cli {
    /// Source file path
    input: PathBuf,

    /// Output path (defaults to `build/output`, or `build/out.ll` with `--emit ir`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to produce
    #[arg(long, value_enum, default_value_t = Emit::Binary)]
    emit: Emit,

    /// Runtime library (C source or object) to link into the executable
    #[arg(long)]
    link: Option<PathBuf>,

    /// Skip the LLVM module verifier
    #[arg(long)]
    no_verify: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Native executable via llc and clang
    Binary,
    /// Textual LLVM IR
    Ir,
    /// Indented syntax tree
    Tree,
    /// Only report diagnostics
    Check,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(message) = run(&cli) {
        error!("{}", message);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let start = Instant::now();

    let source = read_to_string(&cli.input)
        .map_err(|error| format!("failed to read {}: {}", cli.input.display(), error))?;
    let file_name = cli
        .input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("input.tig"));

    let config = Config {
        module_name: file_name.trim_end_matches(".tig").to_string(),
        file_name,
        verify: !cli.no_verify,
        host_target: true,
    };

    let compilation = compile(source.clone(), &config);
    info!("compiled in {:?}", start.elapsed());

    if cli.emit == Emit::Tree {
        if let Some(tree) = &compilation.display_tree {
            print!("{}", tree);
        }
    }

    if !compilation.is_ok() {
        for diagnostic in compilation.diagnostics.iter() {
            eprint!("{}", render_error(diagnostic, &source));
        }
        return Err(format!(
            "{} error(s) in {}",
            compilation.diagnostics.len(),
            cli.input.display()
        ));
    }

    let ir = compilation
        .ir
        .ok_or_else(|| String::from("no IR was produced"))?;

    match cli.emit {
        Emit::Tree | Emit::Check => Ok(()),
        Emit::Ir => {
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("build/out.ll"));
            write_file(&output, &ir)
        }
        Emit::Binary => {
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("build/output"));
            build_executable(&ir, &output, cli.link.as_deref())?;
            info!("total time: {:?}", start.elapsed());
            Ok(())
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create {}: {}", parent.display(), error))?;
    }
    fs::write(path, contents).map_err(|error| format!("failed to write {}: {}", path.display(), error))
}

/// Lowers the IR with `llc` and links it with `clang`.
fn build_executable(ir: &str, output: &Path, runtime: Option<&Path>) -> Result<(), String> {
    let ir_path = output.with_extension("ll");
    let object_path = output.with_extension("o");
    write_file(&ir_path, ir)?;

    let llc = Command::new("llc")
        .arg("-filetype=obj")
        .arg("-relocation-model=pic")
        .arg(&ir_path)
        .arg("-o")
        .arg(&object_path)
        .output()
        .map_err(|error| format!("failed to run llc: {}", error))?;
    if !llc.status.success() {
        return Err(format!(
            "llc failed:\n{}",
            String::from_utf8_lossy(&llc.stderr)
        ));
    }
    info!("compiled {} using llc", object_path.display());

    let mut clang = Command::new("clang");
    clang.args(["-fPIE", "-pie", "-o"]).arg(output).arg(&object_path);
    if let Some(runtime) = runtime {
        clang.arg(runtime);
    }
    let clang = clang
        .output()
        .map_err(|error| format!("failed to run clang: {}", error))?;
    if !clang.status.success() {
        return Err(format!(
            "clang failed:\n{}",
            String::from_utf8_lossy(&clang.stderr)
        ));
    }
    info!("linked {} using clang", output.display());

    Ok(())
}
