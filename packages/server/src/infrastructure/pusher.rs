//! Outbound writer task of a connection.

use bytes::Bytes;
use fhub_shared::frame::PacketWriter;
use tokio::{io::AsyncWrite, sync::mpsc, task::JoinHandle};

/// Spawn the task that writes queued frames to the socket.
///
/// Frames are written in queue order. The task ends when the queue closes
/// (every sender, including the registry's handle, is gone), after which the
/// write half is shut down, or at the first write error.
pub fn pusher_loop<W>(
    mut rx: mpsc::Receiver<Bytes>,
    mut writer: PacketWriter<W>,
) -> JoinHandle<std::io::Result<()>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            writer.write_frame(&frame).await?;
        }
        writer.shutdown().await
    })
}
