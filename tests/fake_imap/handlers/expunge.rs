//! EXPUNGE command handler.
//!
//! Permanently removes all messages with the `\Deleted` flag from the
//! selected folder. Sends `* N EXPUNGE` for each removed message
//! (where N is the original sequence number, adjusted as earlier
//! messages are removed).

use crate::fake_imap::handlers::Selected;
use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the EXPUNGE command. Removes deleted messages and sends
/// untagged EXPUNGE responses.
pub async fn handle_expunge<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mailbox: &Mutex<Mailbox>,
    selected: Option<&Selected>,
    stream: &mut BufReader<S>,
) {
    let Some(selected) = selected else {
        let resp = format!("{tag} BAD No folder selected\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    if selected.read_only {
        let resp = format!("{tag} NO [READ-ONLY] Mailbox is read-only\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    }

    // Remove deleted messages under lock (no await inside).
    let expunged_seqs = mailbox
        .lock()
        .unwrap()
        .get_folder_mut(&selected.name)
        .map(|folder| folder.expunge());

    let Some(expunged_seqs) = expunged_seqs else {
        let resp = format!("{tag} NO Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    // Send untagged EXPUNGE responses outside the lock.
    for seq in &expunged_seqs {
        let line = format!("* {seq} EXPUNGE\r\n");
        if write_line(stream, &line).await.is_err() {
            return;
        }
    }

    let resp = format!("{tag} OK EXPUNGE completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::{MailboxBuilder, TestEmail};
    use tokio::io::BufReader;

    async fn run(mailbox: &Mutex<Mailbox>, selected: Option<&Selected>) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_expunge("A1", mailbox, selected, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn selected(read_only: bool) -> Selected {
        Selected {
            name: "INBOX".into(),
            read_only,
        }
    }

    fn mailbox() -> Mutex<Mailbox> {
        Mutex::new(
            MailboxBuilder::new()
                .folder("INBOX")
                .email(TestEmail::new(1, "a@b.com", "keep"))
                .email(TestEmail::new(2, "a@b.com", "drop").deleted())
                .email(TestEmail::new(3, "a@b.com", "drop").deleted())
                .build(),
        )
    }

    #[tokio::test]
    async fn removes_deleted_messages() {
        let mb = mailbox();

        let output = run(&mb, Some(&selected(false))).await;

        assert_eq!(
            output,
            "* 2 EXPUNGE\r\n* 2 EXPUNGE\r\nA1 OK EXPUNGE completed\r\n"
        );
        assert_eq!(mb.lock().unwrap().get_folder("INBOX").unwrap().uids(), vec![1]);
    }

    #[tokio::test]
    async fn read_only_selection_is_refused() {
        let mb = mailbox();

        let output = run(&mb, Some(&selected(true))).await;

        assert!(output.starts_with("A1 NO [READ-ONLY]"));
        assert_eq!(mb.lock().unwrap().get_folder("INBOX").unwrap().emails.len(), 3);
    }

    #[tokio::test]
    async fn no_folder_selected_returns_bad() {
        let output = run(&mailbox(), None).await;
        assert!(output.contains("A1 BAD No folder selected"));
    }
}
