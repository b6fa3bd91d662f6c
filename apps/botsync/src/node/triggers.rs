use super::Node;
use crate::errors::BotResult;
use crate::protocol::{Command, Message};

impl Node {
    /// `!whoyouknow`
    pub async fn tell_who_you_know(&self, msg: &Message) -> BotResult<()> {
        let known = self.peers.identities();
        let text = if known.is_empty() {
            "I know nobody".to_string()
        } else {
            format!("I know {}", known.join(", "))
        };
        self.sender.send_line(msg.reply_target(), &text).await?;
        Ok(())
    }

    /// `!jobs`
    pub async fn report_jobs(&self, msg: &Message) -> BotResult<()> {
        let report = self.jobs.report().lines().join("\n");
        self.sender.send_line(msg.reply_target(), &report).await?;
        Ok(())
    }

    /// `!getresult:<id>`
    pub async fn get_result(&self, msg: &Message) -> BotResult<()> {
        let Some(Command::GetResult { job_id }) = &msg.command else {
            return Ok(());
        };
        let reply = match self.jobs.result(job_id) {
            Some(value) => Command::Result {
                job_id: job_id.clone(),
                value,
            },
            None => Command::UnknownResult {
                job_id: job_id.clone(),
            },
        };
        self.send(msg.reply_target(), &reply).await
    }

    /// `!quit`, honoured only from the configured owner
    pub async fn handle_quit(&self, msg: &Message) -> BotResult<()> {
        if self.config.owner.as_deref() != Some(msg.sender.as_str()) {
            tracing::debug!(peer = %msg.sender, "Ignoring quit request");
            return Ok(());
        }

        tracing::info!(owner = %msg.sender, "Leaving on request");
        self.sender
            .send_line(&self.config.channel, "I'm leaving now")
            .await?;
        self.sender.quit("Leaving").await?;
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

    fn node(owner: Option<&str>) -> (Arc<Node>, Arc<RecordingSender>) {
        let sender = Arc::new(RecordingSender::new());
        let mut config = Config::new("alice", "#bottest");
        config.owner = owner.map(str::to_string);
        (Node::new(config, sender.clone(), vec![]), sender)
    }

    fn msg(from: &str, to: &str, body: &str) -> Message {
        Message::new(from, format!("{}@host", from), to, body)
    }

    #[tokio::test]
    async fn who_you_know_lists_peers() {
        let (node, sender) = node(None);

        node.tell_who_you_know(&msg("tester", "#bottest", "!whoyouknow"))
            .await
            .unwrap();
        node.peers().record("carol", "c");
        node.peers().record("bob", "b");
        node.tell_who_you_know(&msg("tester", "alice", "!whoyouknow"))
            .await
            .unwrap();

        assert_eq!(sender.messages_to("#bottest"), vec!["I know nobody"]);
        assert_eq!(sender.messages_to("tester"), vec!["I know bob, carol"]);
    }

    #[tokio::test]
    async fn jobs_report_has_four_lines() {
        let (node, sender) = node(None);
        node.emit_job(&msg("tester", "alice", "!emitjob:1:pow,2,2"))
            .await
            .unwrap();

        node.report_jobs(&msg("tester", "alice", "!jobs")).await.unwrap();

        assert_eq!(
            sender.messages_to("tester"),
            vec![
                "Emitted jobs sentout: 1",
                "Emitted jobs accepted:",
                "Received jobs pending:",
                "Received jobs hired:",
            ]
        );
    }

    #[tokio::test]
    async fn get_result_answers_known_and_unknown_ids() {
        let (node, sender) = node(None);
        node.handle_job_result(&msg("bob", "#bottest", "JOBRESULT:42:1024"))
            .await
            .unwrap();

        node.get_result(&msg("tester", "alice", "!getresult:42"))
            .await
            .unwrap();
        node.get_result(&msg("tester", "alice", "!getresult:999"))
            .await
            .unwrap();

        assert_eq!(
            sender.messages_to("tester"),
            vec!["RESULT:42:1024", "UNKNOWN_RESULT:999"]
        );
    }

    #[tokio::test]
    async fn quit_requires_the_owner() {
        let (node, sender) = node(Some("boss"));

        node.handle_quit(&msg("mallory", "alice", "!quit")).await.unwrap();
        assert!(sender.lines().is_empty());

        node.handle_quit(&msg("boss", "alice", "!quit")).await.unwrap();
        assert_eq!(
            sender.lines(),
            vec!["PRIVMSG #bottest :I'm leaving now", "QUIT :Leaving"]
        );
    }

    #[tokio::test]
    async fn quit_without_owner_is_ignored() {
        let (node, sender) = node(None);
        node.handle_quit(&msg("boss", "alice", "!quit")).await.unwrap();
        assert!(sender.lines().is_empty());
    }
}
