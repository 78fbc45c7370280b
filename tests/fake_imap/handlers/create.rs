//! CREATE command handler.
//!
//! A trailing hierarchy delimiter (`CREATE "Projects/"`) asks for a
//! folder that will only hold other folders; the fake server stores
//! it under the name without the delimiter.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::{DELIMITER, Mailbox};
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the CREATE command.
pub async fn handle_create<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    name: &str,
    mailbox: &Mutex<Mailbox>,
    stream: &mut BufReader<S>,
) {
    let name = name.strip_suffix(DELIMITER).unwrap_or(name);
    let created = mailbox.lock().unwrap().create_folder(name);

    let resp = if created {
        format!("{tag} OK CREATE completed\r\n")
    } else {
        format!("{tag} NO [ALREADYEXISTS] Mailbox already exists\r\n")
    };
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, name: &str, mailbox: &Mutex<Mailbox>) -> String {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        handle_create(tag, name, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn creates_missing_folder() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("INBOX").build());

        let output = run("A1", "Archive", &mailbox).await;

        assert_eq!(output, "A1 OK CREATE completed\r\n");
        assert!(mailbox.lock().unwrap().get_folder("Archive").is_some());
    }

    #[tokio::test]
    async fn strips_trailing_delimiter() {
        let mailbox = Mutex::new(MailboxBuilder::new().build());

        run("A1", "Projects/", &mailbox).await;

        assert!(mailbox.lock().unwrap().get_folder("Projects").is_some());
    }

    #[tokio::test]
    async fn existing_folder_is_no() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("Archive").build());

        let output = run("A1", "Archive", &mailbox).await;

        assert!(output.starts_with("A1 NO [ALREADYEXISTS]"));
        assert_eq!(mailbox.lock().unwrap().folders.len(), 1);
    }
}
