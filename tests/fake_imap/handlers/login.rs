//! LOGIN command handler.
//!
//! In real IMAP, credentials are sent in plaintext over the (now
//! encrypted) connection. The fake server accepts exactly the
//! credentials the mailbox was built with.

use crate::fake_imap::handlers::arguments;
use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the LOGIN command. Returns whether the client is now
/// authenticated.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    line: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    let args = arguments(line);
    let accepted = matches!(
        args.as_slice(),
        [user, pass] if *user == mailbox.username && *pass == mailbox.password
    );

    let resp = if accepted {
        format!("{tag} OK LOGIN completed\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
    };
    write_line(stream, &resp).await.is_ok() && accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    /// Create a `BufReader` over an in-memory duplex stream, run the
    /// handler, and return what was written to the client.
    async fn run(tag: &str, line: &str) -> (String, bool) {
        let mailbox = MailboxBuilder::new().credentials("alice", "secret").build();
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let ok = handle_login(tag, line, &mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        (String::from_utf8(buf).unwrap(), ok)
    }

    #[tokio::test]
    async fn accepts_matching_credentials() {
        let (output, ok) = run("A0001", "A0001 LOGIN \"alice\" \"secret\"\r\n").await;
        assert!(ok);
        assert_eq!(output, "A0001 OK LOGIN completed\r\n");
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let (output, ok) = run("A0001", "A0001 LOGIN \"alice\" \"nope\"\r\n").await;
        assert!(!ok);
        assert!(output.starts_with("A0001 NO [AUTHENTICATIONFAILED]"));
    }

    #[tokio::test]
    async fn echoes_client_tag() {
        let (output, _) = run("TAG42", "TAG42 LOGIN alice secret\r\n").await;
        assert!(output.starts_with("TAG42 "));
    }
}
