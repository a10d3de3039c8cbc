use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match contacts_server::start_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=server_exit module=server status=error error={err}");
            eprintln!("contacts_server: {err}");
            ExitCode::FAILURE
        }
    }
}
