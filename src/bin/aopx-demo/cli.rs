// CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aopx-demo")]
#[command(author = "hatlonely <hatlonely@foxmail.com>")]
#[command(version = "0.1.0")]
#[command(about = "Call the demo book controller through the aop pipeline", long_about = None)]
pub struct Cli {
    /// Path to aop config file (json / json5 / yaml / toml, default: built-in)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Simulated latency of addBook (e.g. 2500ms, 1s)
    #[arg(long, global = true, default_value = "2500ms")]
    pub delay: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List books (AopDemoController.getBooks)
    List,
    /// Add a book (AopDemoController.addBook)
    Add(AddArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Book title
    pub book: String,
}
