//! SMTP session handling.
//!
//! [`Connector`] and [`Session`] split the transport into the steps the
//! sender drives: connect (with TLS), authenticate, send, quit. The lettre
//! backed [`SmtpConnector`] is the production implementation.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    time::Duration,
};

use lettre::{
    address::Envelope,
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{SmtpConnection, TlsParameters},
        extension::ClientId,
    },
};
use snafu::ResultExt;

use crate::{error, BoxedError, Error, SmtpPassword};

/// Port on which the server expects TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Authentication mechanisms offered to the server, in order of preference.
const MECHANISMS: [Mechanism; 2] = [Mechanism::Plain, Mechanism::Login];

/// How the session is secured.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TransportSecurity {
    /// TLS is negotiated right after the TCP connection is established.
    ImplicitTls,
    /// Plaintext connection upgraded with the STARTTLS command.
    StartTls,
}

impl TransportSecurity {
    /// Port 465 uses implicit TLS, every other port STARTTLS.
    #[must_use]
    pub const fn for_port(port: u16) -> Self {
        if port == IMPLICIT_TLS_PORT {
            Self::ImplicitTls
        } else {
            Self::StartTls
        }
    }
}

impl fmt::Display for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImplicitTls => write!(f, "implicit-tls"),
            Self::StartTls => write!(f, "starttls"),
        }
    }
}

/// Where and how to open a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    /// SMTP server host name, also used as the TLS server name.
    pub host: String,

    /// SMTP server port.
    pub port: u16,

    /// TLS mode, derived from `port` by [`Endpoint::new`].
    pub security: TransportSecurity,
}

impl Endpoint {
    /// Creates an endpoint, picking the TLS mode from the port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, security: TransportSecurity::for_port(port) }
    }
}

/// Opens SMTP sessions.
pub trait Connector {
    /// Session handed out by [`Connector::connect`].
    type Session: Session;

    /// Connects to `endpoint` and secures the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the TLS negotiation fails.
    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Session, Error>;
}

/// An open, TLS protected SMTP session.
pub trait Session {
    /// Logs in.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    fn authenticate(&mut self, username: &str, password: &SmtpPassword) -> Result<(), Error>;

    /// Transmits `message` to the envelope recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not accept the message.
    fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), Error>;

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the `QUIT` exchange fails.
    fn quit(&mut self) -> Result<(), Error>;
}

/// Closes the wrapped session exactly once when dropped.
pub(crate) struct SessionGuard<S: Session> {
    session: S,
}

impl<S: Session> SessionGuard<S> {
    pub(crate) const fn new(session: S) -> Self { Self { session } }
}

impl<S: Session> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S { &self.session }
}

impl<S: Session> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S { &mut self.session }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        match self.session.quit() {
            Ok(()) => tracing::debug!("SMTP session closed"),
            Err(error) => tracing::debug!(%error, "Ignoring failure while closing SMTP session"),
        }
    }
}

/// [`Connector`] backed by lettre's blocking SMTP client.
#[derive(Clone, Debug)]
pub struct SmtpConnector {
    timeout: Option<Duration>,
    hello_name: ClientId,
}

impl Default for SmtpConnector {
    fn default() -> Self { Self { timeout: None, hello_name: ClientId::default() } }
}

impl SmtpConnector {
    /// Creates a connector. With `timeout` set to `None` socket operations
    /// block until the server answers.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self { Self { timeout, ..Self::default() } }

    /// Overrides the name sent with `EHLO`.
    #[must_use]
    pub fn with_hello_name(mut self, hello_name: ClientId) -> Self {
        self.hello_name = hello_name;
        self
    }
}

impl Connector for SmtpConnector {
    type Session = SmtpSession;

    fn connect(&self, endpoint: &Endpoint) -> Result<SmtpSession, Error> {
        let Endpoint { host, port, security } = endpoint;

        let tls_parameters = TlsParameters::new(host.clone())
            .map_err(BoxedError::from)
            .context(error::TlsParametersSnafu { host })?;

        let implicit_tls = match security {
            TransportSecurity::ImplicitTls => Some(&tls_parameters),
            TransportSecurity::StartTls => None,
        };

        tracing::debug!(%host, port, %security, "Connecting to SMTP server");
        let mut connection = SmtpConnection::connect(
            (host.as_str(), *port),
            self.timeout,
            &self.hello_name,
            implicit_tls,
            None,
        )
        .map_err(BoxedError::from)
        .context(error::ConnectSnafu { host, port: *port })?;

        if *security == TransportSecurity::StartTls {
            if let Err(source) = connection.starttls(&tls_parameters, &self.hello_name) {
                connection.abort();
                return Err(Error::StartTls { host: host.clone(), source: source.into() });
            }
        }

        Ok(SmtpSession { connection })
    }
}

/// Session opened by [`SmtpConnector`].
pub struct SmtpSession {
    connection: SmtpConnection,
}

impl Session for SmtpSession {
    fn authenticate(&mut self, username: &str, password: &SmtpPassword) -> Result<(), Error> {
        let credentials = Credentials::new(username.to_string(), password.expose().to_string());

        self.connection
            .auth(&MECHANISMS, &credentials)
            .map(|_response| ())
            .map_err(BoxedError::from)
            .context(error::AuthenticateSnafu { username })
    }

    fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), Error> {
        let destination =
            envelope.to().iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");

        self.connection
            .send(envelope, message)
            .map(|_response| ())
            .map_err(BoxedError::from)
            .context(error::TransmitSnafu { destination })
    }

    fn quit(&mut self) -> Result<(), Error> {
        self.connection
            .quit()
            .map(|_response| ())
            .map_err(BoxedError::from)
            .context(error::QuitSnafu)
    }
}

impl fmt::Debug for SmtpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSession").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        io::{BufRead, BufReader, Read, Write},
        net::{TcpListener, TcpStream},
        rc::Rc,
        thread::{self, JoinHandle},
    };

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_security_for_port() {
        assert_eq!(TransportSecurity::for_port(465), TransportSecurity::ImplicitTls);
        assert_eq!(TransportSecurity::for_port(587), TransportSecurity::StartTls);
        assert_eq!(TransportSecurity::for_port(25), TransportSecurity::StartTls);
        assert_eq!(TransportSecurity::for_port(2525), TransportSecurity::StartTls);
    }

    #[test]
    fn test_endpoint_new() {
        let endpoint = Endpoint::new("smtp.test", 465);

        assert_eq!(endpoint.host, "smtp.test");
        assert_eq!(endpoint.port, 465);
        assert_eq!(endpoint.security, TransportSecurity::ImplicitTls);
    }

    struct CountingSession {
        quits: Rc<Cell<usize>>,
        fail_quit: bool,
    }

    impl Session for CountingSession {
        fn authenticate(&mut self, _: &str, _: &SmtpPassword) -> Result<(), Error> { Ok(()) }

        fn send(&mut self, _: &Envelope, _: &[u8]) -> Result<(), Error> { Ok(()) }

        fn quit(&mut self) -> Result<(), Error> {
            self.quits.set(self.quits.get() + 1);
            if self.fail_quit {
                Err(Error::Quit { source: "connection reset".into() })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_guard_quits_once_on_drop() {
        let quits = Rc::new(Cell::new(0));
        {
            let mut guard =
                SessionGuard::new(CountingSession { quits: Rc::clone(&quits), fail_quit: false });
            assert!(guard.authenticate("a@x.com", &SmtpPassword::new("secret")).is_ok());
        }
        assert_eq!(quits.get(), 1);
    }

    #[test]
    fn test_guard_swallows_quit_failure() {
        let quits = Rc::new(Cell::new(0));
        drop(SessionGuard::new(CountingSession { quits: Rc::clone(&quits), fail_quit: true }));
        assert_eq!(quits.get(), 1);
    }

    const HELLO_NAME: &str = "review-invite.test";

    fn loopback_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    fn accept(listener: &TcpListener) -> TcpStream {
        let (stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream
    }

    /// Plaintext SMTP server answering `EHLO` with `ehlo_reply`. Returns the
    /// commands it received, stopping after `STARTTLS` or `QUIT`.
    fn serve_plaintext(
        listener: TcpListener,
        ehlo_reply: &'static str,
    ) -> JoinHandle<Vec<String>> {
        thread::spawn(move || {
            let mut writer = accept(&listener);
            let mut reader = BufReader::new(writer.try_clone().unwrap());
            let mut commands = Vec::new();
            if writer.write_all(b"220 localhost ESMTP\r\n").is_err() {
                return commands;
            }

            let mut line = String::new();
            while matches!(reader.read_line(&mut line), Ok(n) if n > 0) {
                let command = line.trim_end().to_string();
                line.clear();

                let reply: &[u8] = match command.as_str() {
                    "STARTTLS" => b"220 Ready to start TLS\r\n",
                    "QUIT" => b"221 Bye\r\n",
                    _ if command.starts_with("EHLO ") => ehlo_reply.as_bytes(),
                    _ => b"502 Command not implemented\r\n",
                };
                let last = matches!(command.as_str(), "STARTTLS" | "QUIT");
                commands.push(command);
                if writer.write_all(reply).is_err() || last {
                    break;
                }
            }
            commands
        })
    }

    fn connector() -> SmtpConnector {
        SmtpConnector::new(Some(Duration::from_secs(5)))
            .with_hello_name(ClientId::Domain(HELLO_NAME.to_string()))
    }

    fn endpoint(port: u16, security: TransportSecurity) -> Endpoint {
        Endpoint { host: "localhost".to_string(), port, security }
    }

    #[test]
    fn test_starttls_is_issued_after_ehlo() {
        let (listener, port) = loopback_listener();
        let server = serve_plaintext(listener, "250-localhost\r\n250 STARTTLS\r\n");

        let error = connector().connect(&endpoint(port, TransportSecurity::StartTls)).unwrap_err();
        let commands = server.join().unwrap();

        assert_eq!(commands, [format!("EHLO {HELLO_NAME}"), "STARTTLS".to_string()]);
        assert!(matches!(error, Error::StartTls { ref host, .. } if host == "localhost"));
        assert_eq!(error.kind(), ErrorKind::Connect);
    }

    #[test]
    fn test_starttls_not_offered() {
        let (listener, port) = loopback_listener();
        let server = serve_plaintext(listener, "250 localhost\r\n");

        let error = connector().connect(&endpoint(port, TransportSecurity::StartTls)).unwrap_err();
        let commands = server.join().unwrap();

        assert_eq!(commands.first(), Some(&format!("EHLO {HELLO_NAME}")));
        assert!(!commands.iter().any(|command| command == "STARTTLS"));
        assert!(matches!(error, Error::StartTls { .. }));
        assert_eq!(error.kind(), ErrorKind::Connect);
    }

    #[test]
    fn test_implicit_tls_starts_with_client_hello() {
        let (listener, port) = loopback_listener();
        let server = thread::spawn(move || {
            let mut stream = accept(&listener);
            let mut first_byte = [0_u8; 1];
            stream.read_exact(&mut first_byte).unwrap();
            first_byte[0]
        });

        let error =
            connector().connect(&endpoint(port, TransportSecurity::ImplicitTls)).unwrap_err();

        // TLS handshake record
        assert_eq!(server.join().unwrap(), 0x16);
        assert!(matches!(error, Error::Connect { port: p, .. } if p == port));
        assert_eq!(error.kind(), ErrorKind::Connect);
    }
}
