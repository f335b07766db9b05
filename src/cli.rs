use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "faq")]
#[command(about = "Ask questions about an indexed FAQ, answered by an AI assistant", long_about = None)]
pub struct Args {
    #[arg(long = "faq-dir", help = "Directory holding the FAQ markdown files")]
    pub faq_dir: Option<String>,

    #[arg(
        long = "filter",
        help = "Only index FAQ files whose path contains this text (empty = all)"
    )]
    pub filter: Option<String>,

    #[arg(long = "model", help = "Model name to use")]
    pub model: Option<String>,

    #[arg(
        long = "api-endpoint",
        help = "Custom API base URL (e.g., http://localhost:11434/v1)"
    )]
    pub api_endpoint: Option<String>,

    #[arg(long = "logs-dir", help = "Directory for interaction logs")]
    pub logs_dir: Option<String>,

    #[arg(short = 'v', long = "verbose", help = "Print diagnostic output")]
    pub verbose: bool,

    #[arg(long = "config-init", help = "Write an example config file and exit")]
    pub config_init: bool,

    #[arg(help = "Question to ask; starts an interactive chat when omitted")]
    pub question: Vec<String>,
}
