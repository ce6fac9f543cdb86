mod bot;
mod commands;
mod config;
mod confirm;
mod cooldown;
mod host;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use acremote_peripherals::ir::output::{DryRun, IrOut, IrOutError};
use acremote_peripherals::ir::types::Transmitter;
use acremote_peripherals::ir::vestel::VestelRemote;
use acremote_peripherals::state_file::{StateFile, StateFileError};
use acremote_peripherals::thermo::{NoThermometer, Thermometer, W1Thermo};
use serenity::{
    async_trait,
    builder::{CreateActionRow, CreateButton, CreateComponents, CreateMessage},
    client::{Context, EventHandler},
    model::{
        application::component::ButtonStyle,
        application::interaction::{Interaction, InteractionResponseType},
        channel::Message,
        gateway::{GatewayIntents, Ready},
        id::{ChannelId, UserId},
    },
    Client,
};
use structopt::StructOpt;
use thiserror::Error;
use tokio::task::spawn_blocking;

use crate::bot::{menu_button_id, Bot, Incoming, Outgoing, Recipient};
use crate::config::{ConfigError, ConfigHandler};
use crate::host::RaspberryPi;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

/// The ir led, or a log line per frame when configured for a dry run.
enum Output {
    Gpio(IrOut),
    DryRun(DryRun),
}

impl Transmitter for Output {
    type Error = IrOutError;

    fn transmit(&mut self, bits: &str) -> Result<(), IrOutError> {
        match self {
            Output::Gpio(out) => out.transmit(bits),
            Output::DryRun(dry) => match dry.transmit(bits) {
                Ok(()) => Ok(()),
                Err(never) => match never {},
            },
        }
    }
}

type AcBot = Bot<Output, Box<dyn Thermometer + Send>>;

#[derive(Error, Debug)]
enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    StateFile(#[from] StateFileError),
    #[error(transparent)]
    IrOut(#[from] IrOutError),
    #[error("Discord client failed")]
    Serenity(#[from] serenity::Error),
}

#[derive(StructOpt, Debug)]
#[structopt(name = "acremote-discord")]
struct Opt {
    /// Defaults to /etc/acremote.json
    #[structopt(long)]
    config: Option<PathBuf>,
}

fn button(label: &str, custom_id: &str, style: ButtonStyle) -> CreateButton {
    let mut b = CreateButton::default();
    b.label(label);
    b.custom_id(custom_id);
    b.style(style);
    b
}

fn add_rows<'c>(c: &'c mut CreateComponents, out: &Outgoing) -> &'c mut CreateComponents {
    if let Some(token) = out.confirm {
        let mut ar = CreateActionRow::default();
        ar.add_button(button("Yes", &confirm::custom_id(token, true), ButtonStyle::Success));
        ar.add_button(button("No", &confirm::custom_id(token, false), ButtonStyle::Danger));
        c.add_action_row(ar);
    }
    if let Some(menu) = out.menu {
        for row in menu.rows() {
            let mut ar = CreateActionRow::default();
            for name in row.iter() {
                ar.add_button(button(
                    &format!("/{}", name),
                    &menu_button_id(name),
                    ButtonStyle::Secondary,
                ));
            }
            c.add_action_row(ar);
        }
    }
    c
}

fn build<'a, 'b>(m: &'b mut CreateMessage<'a>, out: &Outgoing) -> &'b mut CreateMessage<'a> {
    m.content(&out.text);
    if out.confirm.is_some() || out.menu.is_some() {
        m.components(|c| add_rows(c, out));
    }
    m
}

async fn deliver(ctx: &Context, channel: ChannelId, outgoing: Vec<Outgoing>) {
    for out in outgoing {
        let target = match out.to {
            Recipient::Sender => Ok(channel),
            Recipient::User(id) => UserId(id).create_dm_channel(ctx).await.map(|dm| dm.id),
        };
        let result = match target {
            Ok(target) => target.send_message(ctx, |m| build(m, &out)).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!("could not send message to {:?}: {}", out.to, e);
        }
    }
}

struct Handler {
    bot: Arc<Mutex<AcBot>>,
}

impl Handler {
    /// Runs on the blocking pool; frames and the fungus proof cycle block.
    async fn route<F>(&self, f: F) -> Vec<Outgoing>
    where
        F: FnOnce(&mut AcBot) -> Vec<Outgoing> + Send + 'static,
    {
        let bot = self.bot.clone();
        let task = spawn_blocking(move || match bot.lock() {
            Ok(mut bot) => f(&mut bot),
            Err(_) => {
                error!("bot lock poisoned");
                Vec::new()
            }
        });
        match task.await {
            Ok(out) => out,
            Err(e) => {
                error!("bot task failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn run_deferred(&self) {
        let bot = self.bot.clone();
        let task = spawn_blocking(move || {
            if let Ok(mut bot) = bot.lock() {
                if let Some(action) = bot.take_deferred() {
                    info!("running {:?}", action);
                    bot.run_host_action(action);
                }
            }
        });
        if let Err(e) = task.await {
            error!("host action failed: {}", e);
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || !msg.is_private() {
            return;
        }
        trace!("message: {:?}", msg);

        let incoming = Incoming {
            user_id: msg.author.id.0,
            user_name: msg.author.name.clone(),
            text: msg.content.clone(),
        };
        let out = self.route(move |bot| bot.handle_message(&incoming)).await;
        deliver(&ctx, msg.channel_id, out).await;
        self.run_deferred().await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let component = match interaction {
            Interaction::MessageComponent(component) => component,
            other => {
                trace!("ignoring interaction {:?}", other.kind());
                return;
            }
        };

        if let Err(e) = component
            .create_interaction_response(&ctx.http, |r| {
                r.kind(InteractionResponseType::DeferredUpdateMessage)
            })
            .await
        {
            error!("could not acknowledge interaction: {}", e);
        }

        let custom_id = component.data.custom_id.clone();
        if confirm::parse_custom_id(&custom_id).is_some() {
            if let Err(e) = component.message.delete(&ctx).await {
                debug!("could not remove confirmation prompt: {}", e);
            }
        }

        let user_id = component.user.id.0;
        let user_name = component.user.name.clone();
        let out = self
            .route(move |bot| bot.handle_button(user_id, &user_name, &custom_id))
            .await;
        deliver(&ctx, component.channel_id, out).await;
        self.run_deferred().await;
    }

    async fn ready(&self, _: Context, ready: Ready) {
        info!("{} is connected", ready.user.name);
    }
}

async fn run(opt: Opt) -> Result<(), StartError> {
    let handler = match opt.config {
        Some(path) => ConfigHandler::new(path),
        None => ConfigHandler::default(),
    };
    let config = handler.read()?;

    let state_file = StateFile::new(&config.state_file);
    let state = state_file.load()?;
    let output = if config.dry_run {
        Output::DryRun(DryRun::new())
    } else {
        Output::Gpio(IrOut::start(config.gpio_pin)?)
    };
    let thermometer: Box<dyn Thermometer + Send> = match W1Thermo::new(&config.w1_base) {
        Ok(t) => Box::new(t),
        Err(e) => {
            warn!("no 1-wire thermometer, feeling and room readings disabled: {}", e);
            Box::new(NoThermometer)
        }
    };
    let remote = VestelRemote::with_state(state, output, thermometer);
    let bot = Bot::new(remote, state_file, &config, Box::new(RaspberryPi));

    let event_handler = Handler {
        bot: Arc::new(Mutex::new(bot)),
    };
    let intents = GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&config.token, intents)
        .event_handler(event_handler)
        .await?;
    client.start().await?;
    Ok(())
}

#[tokio::main]
pub async fn main() {
    pretty_env_logger::init();

    if let Err(e) = run(Opt::from_args()).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
