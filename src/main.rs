use log::LevelFilter;
use std::process::ExitCode;
use tidecell::logging::init_logging;
use tidecell::pipeline::{error_chain, run};
use tidecell::PipelineConfig;

fn main() -> ExitCode {
    init_logging(LevelFilter::Info);

    match run(&PipelineConfig::default()) {
        Ok(written) => {
            for path in &written {
                log::info!("  {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let mut chain = error_chain(&err).into_iter();
            if let Some(first) = chain.next() {
                log::error!("{}", first);
            }
            for cause in chain {
                log::error!("  caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
