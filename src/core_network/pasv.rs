use log::debug;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

/// A pending passive-mode data channel: an ephemeral listening socket that
/// accepts exactly one transfer connection and is then retired. Single use is
/// enforced by [`DataChannel::accept_transfer`] consuming the channel;
/// dropping an unused channel closes the listener.
#[derive(Debug)]
pub struct DataChannel {
    listener: TcpListener,
}

impl DataChannel {
    /// Binds a listener on an ephemeral port with a backlog of one and
    /// returns it together with the bound port.
    pub fn open_passive(bind_ip: Ipv4Addr) -> io::Result<(Self, u16)> {
        let socket = TcpSocket::new_v4()?;
        socket.bind(SocketAddr::new(IpAddr::V4(bind_ip), 0))?;
        let listener = socket.listen(1)?;
        let port = listener.local_addr()?.port();
        debug!("Passive listener bound on {}:{}", bind_ip, port);
        Ok((Self { listener }, port))
    }

    /// Waits for the single peer connection and returns the transfer stream.
    /// The listening socket is closed as soon as this returns.
    pub async fn accept_transfer(self) -> io::Result<TcpStream> {
        let (stream, peer) = self.listener.accept().await?;
        debug!("Accepted data connection from {}", peer);
        Ok(stream)
    }
}

/// Formats the 227 reply advertising `ip` and `port` in the legacy
/// four-octet, split-port form.
pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let octets = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{}).\r\n",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}
