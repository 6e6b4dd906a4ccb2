use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley_gateway::chatbot::Chatbot;
use parley_gateway::services::{NewsService, StockService, WeatherService};
use parley_gateway::session::{ConversationSession, Utterance};
use parley_gateway::voice::{SpeechAdapter, SpeechToText, TextToSpeech};
use parley_gateway::Config;

/// Parley - voice chatbot gateway for weather, stocks, and news
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PARLEY_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features
    #[arg(long, env = "PARLEY_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP/WebSocket server (default)
    Serve,
    /// Interactive text chat in the terminal
    Chat,
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley_gateway=info",
        1 => "info,parley_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.disable_voice {
        config.voice.enabled = false;
    }

    let speech = build_speech(&config);
    let chatbot = build_chatbot(&config, speech.clone());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = parley_gateway::api::ApiServer::new(
                chatbot,
                speech,
                config.port,
                config.history_cap,
            );
            server.run().await?;
        }
        Command::Chat => repl(&chatbot, config.history_cap).await?,
        Command::Ask { text } => {
            let session = ConversationSession::new(1);
            let turn = chatbot.handle(Utterance::typed(text), &session).await;
            println!("{}", turn.response);
        }
    }

    Ok(())
}

/// Wire up service clients from configured API keys
///
/// Missing keys are fine: the clients answer with an invalid-key failure
/// instead of refusing to start.
fn build_chatbot(config: &Config, speech: Option<Arc<SpeechAdapter>>) -> Arc<Chatbot> {
    let key = |k: &Option<String>| k.clone().unwrap_or_default();

    let weather = Arc::new(WeatherService::new(key(&config.api_keys.openweather)));
    let stock = Arc::new(StockService::new(key(&config.api_keys.alphavantage)));
    let news = Arc::new(NewsService::new(key(&config.api_keys.newsapi)));

    let mut chatbot = Chatbot::new(weather, stock, news);
    if let Some(speech) = speech {
        chatbot = chatbot.with_speech(speech);
    }
    Arc::new(chatbot)
}

/// Build the speech adapter if voice is enabled and keys allow it
///
/// Prefers OpenAI for both directions; falls back to Deepgram for STT and
/// ElevenLabs for TTS when those keys are present instead.
fn build_speech(config: &Config) -> Option<Arc<SpeechAdapter>> {
    if !config.voice.enabled {
        return None;
    }
    let keys = &config.api_keys;
    let voice = &config.voice;

    let stt = if let Some(key) = &keys.openai {
        SpeechToText::whisper(key.clone(), voice.stt_model.clone())
    } else if let Some(key) = &keys.deepgram {
        SpeechToText::deepgram(key.clone(), voice.stt_model.clone())
    } else {
        tracing::info!("no STT key configured, voice input disabled");
        return None;
    };

    let tts = if let Some(key) = &keys.openai {
        TextToSpeech::openai(
            key.clone(),
            voice.tts_voice.clone(),
            voice.tts_speed,
            voice.tts_model.clone(),
        )
    } else if let Some(key) = &keys.elevenlabs {
        TextToSpeech::elevenlabs(
            key.clone(),
            voice.tts_voice.clone(),
            "eleven_monolingual_v1".to_string(),
        )
    } else {
        tracing::info!("no TTS key configured, voice output disabled");
        return None;
    };

    match (stt, tts) {
        (Ok(stt), Ok(tts)) => Some(Arc::new(SpeechAdapter::new(stt, tts))),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "voice setup failed, continuing text-only");
            None
        }
    }
}

/// Interactive terminal chat loop
async fn repl(chatbot: &Arc<Chatbot>, history_cap: usize) -> anyhow::Result<()> {
    let session = ConversationSession::new(history_cap);
    let stdin = std::io::stdin();

    println!("Parley ready. Ask about weather, stocks, or news. Type 'quit' to exit.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let turn = chatbot.handle(Utterance::typed(line), &session).await;
        println!("{}", turn.response);
    }

    println!("Goodbye!");
    Ok(())
}
