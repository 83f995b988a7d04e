use crate::MonitorCommand;
use std::str::FromStr;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::{UnixListener, UnixStream},
    sync::mpsc::UnboundedSender,
};
mod parser;

pub async fn server(
    socket: UnixListener,
    tx_command: UnboundedSender<MonitorCommand>,
) -> Result<(), std::io::Error> {
    loop {
        let (stream, _) = socket.accept().await?;
        tokio::spawn(handle_stream(stream, tx_command.clone()));
    }
}

pub async fn handle_stream(
    stream: UnixStream,
    tx_command: UnboundedSender<MonitorCommand>,
) -> Result<(), std::io::Error> {
    let mut client = BufReader::new(stream).lines();
    while let Some(line) = client.next_line().await? {
        // ignore lines that cannot be parsed
        if let Ok(cmd) = MonitorCommand::from_str(&line) {
            if tx_command.send(cmd).is_err() {
                break;
            }
        }
    }
    Ok(())
}
