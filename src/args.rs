use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "preview-seo")]
#[command(about = "Fetches a page preview, analyses it and prints the panel state as JSON")]
#[command(version)]
pub struct Args {
    /// Panel configuration file (JSON)
    pub config: String,

    /// Endpoint of the analysis service
    #[arg(long, default_value = "http://localhost:8787/analyze")]
    pub engine_url: String,

    /// Load the preview through this WebDriver server instead of plain HTTP
    #[arg(long)]
    pub webdriver: Option<String>,

    /// CSS selector of the analysed content, overriding the configuration
    #[arg(long)]
    pub selector: Option<String>,
}
