use crate::application_port::{PromptError, Prompter};
use crate::domain_model::Identifier;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

const IDENTIFIER_QUESTION: &str = "Identifier of the user to update: ";
const IDENTIFIER_REQUIRED: &str = "Identifier cannot be empty";
const ADMIN_QUESTION: &str = "Set this user as an admin? (yes/no)";
const ADMIN_PATTERN: &str = "Answer must be \"yes\" or \"no\"";

/// Line-oriented prompts over any async reader/writer pair.
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
}

impl LinePrompter<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        LinePrompter::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LinePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        LinePrompter { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        self.writer.write_all(question.as_bytes()).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(line.trim().to_string())
    }

    async fn say(&mut self, message: &str) -> Result<(), PromptError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// `yes`/`no` in any case; an empty answer takes `default`.
fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    if answer.is_empty() {
        Some(default)
    } else if answer.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if answer.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

#[async_trait::async_trait]
impl<R, W> Prompter for LinePrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn identifier(&mut self) -> Result<Identifier, PromptError> {
        loop {
            let answer = self.ask(IDENTIFIER_QUESTION).await?;
            match Identifier::parse(&answer) {
                Some(identifier) => return Ok(identifier),
                None => self.say(IDENTIFIER_REQUIRED).await?,
            }
        }
    }

    async fn confirm_admin(&mut self, current: bool) -> Result<bool, PromptError> {
        let default = if current { "yes" } else { "no" };
        let question = format!("{ADMIN_QUESTION} [{default}]: ");
        loop {
            let answer = self.ask(&question).await?;
            match parse_yes_no(&answer, current) {
                Some(is_admin) => return Ok(is_admin),
                None => self.say(ADMIN_PATTERN).await?,
            }
        }
    }
}
