//! Dry-runs a launch against a local archive and prints what the browser
//! would do.
#[cfg(not(target_arch = "wasm32"))]
mod preview_cli {
    use clap::Parser;
    use dosbox_web::launch_options::DEFAULT_MASTER_VOLUME;
    use dosbox_web::preview::{PreviewEmulator, PreviewPage};
    use dosbox_web::{LaunchOptions, RunCommands, ScaleMode, Session, Size};
    use std::collections::HashMap;

    #[derive(Parser, Debug)]
    #[command(
        name = "launch_preview",
        about = "Dry-run a DOSBox launch against a local zip archive and print every emulator call."
    )]
    pub struct Args {
        /// Content archive (.zip) to extract
        pub zip: String,

        /// Drive directory the archive is extracted into
        #[arg(long, value_name = "DIR", default_value = "")]
        pub persist: String,

        /// Command to run after start-up; repeatable. A lone `?name` reads the
        /// commands from the `name` query parameter
        #[arg(long = "run", value_name = "CMD")]
        pub run: Vec<String>,

        /// Mixer master volume
        #[arg(long, value_name = "L:R", default_value = DEFAULT_MASTER_VOLUME)]
        pub volume: String,

        /// Page title prefix
        #[arg(long, value_name = "TITLE")]
        pub title: Option<String>,

        /// Browser viewport size
        #[arg(long, value_name = "WxH", default_value = "1280x800")]
        pub viewport: Size,

        /// Resolution DOSBox renders at
        #[arg(long, value_name = "WxH", default_value = "640x400")]
        pub native: Size,

        /// Container scaling mode
        #[arg(long, value_name = "MODE", default_value_t = ScaleMode::default())]
        pub scaling: ScaleMode,

        /// Page URL query parameter; repeatable
        #[arg(long = "query", value_name = "NAME=VALUE", value_parser = parse_query)]
        pub query: Vec<(String, String)>,
    }

    fn parse_query(pair: &str) -> Result<(String, String), String> {
        pair.split_once('=')
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .ok_or_else(|| format!("expected NAME=VALUE, got \"{}\"", pair))
    }

    impl Args {
        pub fn launch_options(&self) -> LaunchOptions {
            let run = match self.run.as_slice() {
                [single] => RunCommands::from(single.as_str()),
                many => RunCommands::from(many.to_vec()),
            };
            LaunchOptions {
                master_volume: self.volume.clone(),
                run,
                zip: self.zip.clone(),
                persist: self.persist.clone(),
                title: self.title.clone(),
                scale_mode: self.scaling,
            }
        }

        pub fn query(&self) -> HashMap<String, String> {
            self.query.iter().cloned().collect()
        }
    }

    pub async fn run(args: Args) -> bool {
        let page = PreviewPage::new(args.viewport, args.native).with_query(args.query());
        let mut session = Session::new(PreviewEmulator::new(), page);
        let launched = session.start(args.launch_options()).await.is_some();

        for line in session.emulator().transcript() {
            println!("{}", line);
        }
        let page = session.page();
        if let Some(size) = page.container_size() {
            println!("container: {} ({})", size, args.scaling);
        }
        if let Some(title) = page.title() {
            println!("title: {}", title);
        }
        if let Some(message) = page.message() {
            eprintln!("error: {}", message);
        }
        launched
    }

}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(basic_scheduler)]
async fn main() {
    use clap::Parser;

    env_logger::init();
    let args = preview_cli::Args::parse();
    if !preview_cli::run(args).await {
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
