use super::Node;
use crate::errors::BotResult;
use crate::protocol::{Command, Message};

impl Node {
    /// Sends our announcement to `destination`; cheap to repeat
    pub async fn announce(&self, destination: &str) -> BotResult<()> {
        let command = Command::Bot {
            peer_id: self.self_id.to_string(),
        };
        self.send(destination, &command).await
    }

    /// Advertises ourselves to the channel, once per node
    pub async fn advertise(&self) -> BotResult<()> {
        if !self.peers.mark_advertised() {
            tracing::debug!("Already advertised");
            return Ok(());
        }
        let command = Command::Adv {
            peer_id: self.self_id.to_string(),
        };
        self.send(&self.config.channel, &command).await
    }

    /// `ADV:<id>`: remember the peer and introduce ourselves back
    pub async fn handle_advertisement(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::Adv { peer_id }) = &msg.command else {
            return Ok(());
        };
        if self.peers.record(&msg.sender, peer_id) {
            tracing::info!(peer = %msg.sender, peer_id = %peer_id, "New peer advertised");
        }
        self.announce(&msg.sender).await
    }

    /// `BOT:<id>`: remember the peer
    pub async fn handle_announcement(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::Bot { peer_id }) = &msg.command else {
            return Ok(());
        };
        if self.peers.record(&msg.sender, peer_id) {
            tracing::info!(peer = %msg.sender, peer_id = %peer_id, "New peer announced");
        } else {
            tracing::debug!(peer = %msg.sender, "Known peer announced again");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::Config;
    use crate::node::Node;
    use crate::protocol::Message;
    use crate::transport::memory::RecordingSender;

    fn node() -> (Arc<Node>, Arc<RecordingSender>) {
        let sender = Arc::new(RecordingSender::new());
        let node = Node::new(Config::new("alice", "#bottest"), sender.clone(), vec![]);
        (node, sender)
    }

    #[tokio::test]
    async fn advertisement_records_peer_and_replies() {
        let (node, sender) = node();

        let msg = Message::new("bob", "b@host", "#bottest", "ADV:bob-id");
        node.handle_advertisement(&msg).await.unwrap();

        assert_eq!(node.peers().get("bob").unwrap().display_tag, "bob-id");
        assert_eq!(
            sender.messages_to("bob"),
            vec![format!("BOT:{}", node.self_id())]
        );
    }

    #[tokio::test]
    async fn repeated_announcements_keep_one_entry() {
        let (node, _sender) = node();

        let msg = Message::new("bob", "b@host", "alice", "BOT:bob-id");
        node.handle_announcement(&msg).await.unwrap();
        node.handle_announcement(&msg).await.unwrap();

        assert_eq!(node.peers().len(), 1);
        assert_eq!(node.peers().identities(), vec!["bob"]);
    }

    #[tokio::test]
    async fn advertise_is_sent_once() {
        let (node, sender) = node();

        node.advertise().await.unwrap();
        node.advertise().await.unwrap();

        assert_eq!(
            sender.messages_to("#bottest"),
            vec![format!("ADV:{}", node.self_id())]
        );
    }

    #[tokio::test]
    async fn announce_is_not_guarded() {
        let (node, sender) = node();

        node.announce("#bottest").await.unwrap();
        node.announce("#bottest").await.unwrap();

        assert_eq!(sender.messages_to("#bottest").len(), 2);
    }
}
