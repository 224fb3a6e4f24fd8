// ABOUTME: Logs command implementation.
// ABOUTME: Prints the service's most recent log lines using the detected dialect.

use super::connection::{connect, disconnect, flush_warnings};
use hoist::channel::RemoteChannel;
use hoist::config::Config;
use hoist::diagnostics::Diagnostics;
use hoist::error::{Error, Result};
use hoist::output::Output;
use hoist::runtime::detect;

pub async fn logs(config: Config, tail: u32, output: Output) -> Result<()> {
    let mut diag = Diagnostics::default();
    let target = config.target()?;

    let session = connect(&config, &output).await?;
    let result = async {
        let dialect = detect(&session).await;
        let compose = dialect.compose().ok_or_else(|| {
            Error::Remote("neither docker-compose nor the compose plugin is available".to_string())
        })?;
        let out = session
            .execute(&compose.logs_command(&target, tail))
            .await?;
        if !out.success() {
            return Err(Error::Remote(format!(
                "logs exited with {}: {}",
                out.exit_code,
                out.stderr.trim()
            )));
        }
        Ok::<String, Error>(out.stdout)
    }
    .await;
    disconnect(session, &mut diag).await;
    flush_warnings(&diag, &output);

    print!("{}", result?);
    Ok(())
}
