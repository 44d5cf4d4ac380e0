//! Interactive chat loop on stdin/stdout.

use std::io::Write;
use std::path::{Path, PathBuf};

use auravo_chat::{
    Composer, ConversationController, FileRecorder, InputMode, MicrophoneRecorder, Submission,
    Typewriter, VoiceCapture,
};
use auravo_core::config::{ChatConfig, VoiceConfig};
use auravo_core::{ConversationId, DataUri, Message, MessageContent};
use auravo_gateway::suggested_prompts;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

const HELP: &str = "\
Commands:
  /new            start a new conversation
  /list           list conversations
  /switch <n>     switch to conversation n from /list
  /image          toggle image mode
  /imagine <text> generate an image
  /record         start recording from the microphone
  /stop           stop recording and transcribe into the input
  /voice <file>   transcribe an audio file into the input
  /suggest [n]    show starter prompts, or send prompt n
  /help           show this help
  /quit           exit
An empty line sends a pending voice transcript.";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    New,
    List,
    Switch(usize),
    ToggleImage,
    Record,
    StopRecording,
    Voice(PathBuf),
    Suggest(Option<usize>),
    Help,
    Quit,
    /// Text to send, including `/imagine` directives.
    Send(String),
    Invalid(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') || line.starts_with("/imagine") {
            return ReplCommand::Send(line.to_string());
        }
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        match (name, arg) {
            ("/new", "") => ReplCommand::New,
            ("/list", "") => ReplCommand::List,
            ("/switch", n) => match n.parse::<usize>() {
                Ok(n) if n > 0 => ReplCommand::Switch(n),
                _ => ReplCommand::Invalid("usage: /switch <n>".to_string()),
            },
            ("/image", "") => ReplCommand::ToggleImage,
            ("/record", "") => ReplCommand::Record,
            ("/stop", "") => ReplCommand::StopRecording,
            ("/voice", "") => ReplCommand::Invalid("usage: /voice <file>".to_string()),
            ("/voice", path) => ReplCommand::Voice(PathBuf::from(path)),
            ("/suggest", "") => ReplCommand::Suggest(None),
            ("/suggest", n) => match n.parse::<usize>() {
                Ok(n) if n > 0 => ReplCommand::Suggest(Some(n)),
                _ => ReplCommand::Invalid("usage: /suggest [n]".to_string()),
            },
            ("/help", "") => ReplCommand::Help,
            ("/quit", "") | ("/exit", "") => ReplCommand::Quit,
            _ => ReplCommand::Invalid(format!("unknown command '{}', try /help", name)),
        }
    }
}

/// Chat session state for the terminal.
pub struct Repl {
    controller: ConversationController,
    composer: Composer,
    microphone: VoiceCapture,
    typewriter: Typewriter,
    chat: ChatConfig,
    voice: VoiceConfig,
    image_dir: PathBuf,
    /// Title tasks still running; awaited before the loop returns.
    title_tasks: Vec<JoinHandle<()>>,
}

impl Repl {
    pub fn new(
        controller: ConversationController,
        chat: ChatConfig,
        voice: VoiceConfig,
        data_dir: &Path,
    ) -> Self {
        let microphone = VoiceCapture::new(
            Box::new(MicrophoneRecorder::new(&voice)),
            controller.gateway(),
            &voice,
        );
        Self {
            controller,
            composer: Composer::new(),
            microphone,
            typewriter: Typewriter::from_millis(chat.typewriter_delay_ms),
            chat,
            voice,
            image_dir: data_dir.join("images"),
            title_tasks: Vec::new(),
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.run_with(BufReader::new(tokio::io::stdin())).await
    }

    /// Run until `/quit` or end of input, then wait for pending titles.
    pub async fn run_with<R>(mut self, input: R) -> Result<(), Box<dyn std::error::Error>>
    where
        R: AsyncBufRead + Unpin,
    {
        println!("Auravo. Type /help for commands.");
        let result = self.read_loop(input).await;
        self.shutdown().await;
        result
    }

    async fn read_loop<R>(&mut self, input: R) -> Result<(), Box<dyn std::error::Error>>
    where
        R: AsyncBufRead + Unpin,
    {
        self.show_current()?;
        self.prompt();

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match ReplCommand::parse(&line) {
                ReplCommand::Quit => break,
                command => {
                    if let Err(e) = self.handle(command).await {
                        tracing::warn!(error = %e, "Command failed");
                        println!("Error: {}", e);
                    }
                }
            }
            self.prompt();
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        if self.microphone.cancel() {
            println!("Recording discarded.");
        }
        if !self.title_tasks.is_empty() {
            tracing::debug!(pending = self.title_tasks.len(), "Waiting for title tasks");
        }
        for handle in self.title_tasks.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Title task panicked");
            }
        }
    }

    async fn handle(&mut self, command: ReplCommand) -> Result<(), Box<dyn std::error::Error>> {
        match command {
            ReplCommand::New => {
                let id = self.controller.new_conversation()?;
                println!("Started {}", id);
                self.show_suggestions();
            }
            ReplCommand::List => {
                for (i, entry) in self.controller.conversations()?.iter().enumerate() {
                    let marker = if entry.is_current { '*' } else { ' ' };
                    println!(
                        "{} {:>2}. {} ({} messages)",
                        marker,
                        i + 1,
                        entry.title,
                        entry.message_count
                    );
                }
            }
            ReplCommand::Switch(n) => {
                let entries = self.controller.conversations()?;
                match entries.get(n - 1) {
                    Some(entry) => {
                        self.controller.select_conversation(&entry.id)?;
                        self.show_current()?;
                    }
                    None => println!("No conversation {}; there are {}.", n, entries.len()),
                }
            }
            ReplCommand::ToggleImage => {
                let mode = self.composer.toggle_mode();
                println!("{} mode", mode);
            }
            ReplCommand::Record => match self.microphone.start() {
                Ok(()) => println!("Recording... type /stop when done."),
                Err(e) => report(&e),
            },
            ReplCommand::StopRecording => {
                if !self.microphone.is_recording() {
                    println!("Not recording.");
                } else {
                    println!("Transcribing...");
                    match self.microphone.stop().await {
                        Ok(transcript) => self.accept_transcript(&transcript),
                        Err(e) => report(&e),
                    }
                }
            }
            ReplCommand::Voice(path) => self.transcribe(path).await,
            ReplCommand::Suggest(None) => self.show_suggestions(),
            ReplCommand::Suggest(Some(n)) => {
                match suggested_prompts(self.chat.suggested_prompt_count).get(n - 1) {
                    Some(prompt) => self.submit(Submission::text(*prompt)).await?,
                    None => println!("No suggestion {}.", n),
                }
            }
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Invalid(reason) => println!("{}", reason),
            ReplCommand::Send(text) => {
                if !text.is_empty() {
                    self.composer.set_text(text);
                }
                if let Some(submission) = self.composer.take_submission() {
                    self.submit(submission).await?;
                }
            }
            ReplCommand::Quit => {}
        }
        Ok(())
    }

    async fn transcribe(&mut self, path: PathBuf) {
        let mut voice = VoiceCapture::new(
            Box::new(FileRecorder::new(path)),
            self.controller.gateway(),
            &self.voice,
        );
        if let Err(e) = voice.start() {
            report(&e);
            return;
        }
        println!("Transcribing...");
        match voice.stop().await {
            Ok(transcript) => self.accept_transcript(&transcript),
            Err(e) => report(&e),
        }
    }

    fn accept_transcript(&mut self, transcript: &str) {
        self.composer.apply_transcript(transcript);
        println!("Transcript: {}", self.composer.text());
        println!("Press Enter to send it, or type to replace it.");
    }

    async fn submit(&mut self, submission: Submission) -> Result<(), Box<dyn std::error::Error>> {
        let id = self.current_id()?;
        let outcome = self
            .controller
            .send_message(&id, &submission.content, submission.prompt_override())
            .await?;
        if let Some(reply) = outcome.reply() {
            self.render_reply(&id, reply).await?;
        }
        if let Some(handle) = outcome.into_title_task() {
            self.title_tasks.retain(|task| !task.is_finished());
            self.title_tasks.push(handle);
        }
        Ok(())
    }

    async fn render_reply(
        &self,
        id: &ConversationId,
        reply: &Message,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &reply.content {
            MessageContent::Text(text) if reply.is_streaming => {
                print!("model: ");
                let mut stdout = std::io::stdout();
                self.typewriter
                    .play(text, |chunk| {
                        print!("{}", chunk);
                        let _ = stdout.flush();
                    })
                    .await;
                println!();
                self.controller.finish_streaming(id)?;
            }
            MessageContent::Text(text) => println!("model: {}", text),
            MessageContent::Image(image) => {
                let count = self.controller.messages(id)?.len();
                match self.save_image(id, count, image).await {
                    Ok(path) => println!("model: [image saved to {}]", path.display()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not save generated image");
                        println!("model: [{} image, not saved]", image.mime_type());
                    }
                }
            }
        }
        Ok(())
    }

    async fn save_image(
        &self,
        id: &ConversationId,
        index: usize,
        image: &DataUri,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let ext = image.mime_type().split('/').nth(1).unwrap_or("bin");
        let path = self.image_dir.join(format!("{}-{}.{}", id, index, ext));
        tokio::fs::create_dir_all(&self.image_dir).await?;
        tokio::fs::write(&path, image.decode()?).await?;
        Ok(path)
    }

    fn show_current(&self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(conversation) = self.controller.current()? else {
            return Ok(());
        };
        println!("== {} ==", conversation.title);
        if conversation.messages.is_empty() {
            self.show_suggestions();
        }
        for message in &conversation.messages {
            match &message.content {
                MessageContent::Text(text) => println!("{}: {}", message.role, text),
                MessageContent::Image(image) => {
                    println!("{}: [{} image]", message.role, image.mime_type())
                }
            }
        }
        Ok(())
    }

    fn show_suggestions(&self) {
        let prompts = suggested_prompts(self.chat.suggested_prompt_count);
        if prompts.is_empty() {
            return;
        }
        println!("Try one of these with /suggest <n>:");
        for (i, prompt) in prompts.iter().enumerate() {
            println!("  {}. {}", i + 1, prompt);
        }
    }

    fn current_id(&self) -> Result<ConversationId, Box<dyn std::error::Error>> {
        self.controller
            .current_id()?
            .ok_or_else(|| "no current conversation".into())
    }

    fn prompt(&self) {
        let label = match self.composer.mode() {
            InputMode::Text => "you",
            InputMode::Image => "imagine",
        };
        print!("{}> ", label);
        let _ = std::io::stdout().flush();
    }
}

fn report(err: &auravo_chat::CaptureError) {
    match err.notice() {
        Some(notice) => println!("{}", notice),
        None => println!("Error: {}", err),
    }
}
