use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Change a user's admin flag and drop their cached session")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    /// Number of workers; defaults to the number of CPU cores.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Run as worker `<index>` instead of supervising.
    #[arg(long, hide = true)]
    pub worker: Option<usize>,

    /// Tag shared by all workers of one supervisor run.
    #[arg(long, hide = true)]
    pub run_id: Option<String>,
}
