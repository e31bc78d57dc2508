//! Server-driven players.
//!
//! Bots speak through the configured LLM providers when available and fall
//! back to canned heuristics otherwise. Their votes are random picks among the
//! other alive players.

use crate::llm::{GenerateRequest, LlmConfig, LlmManager};
use crate::room::Room;
use crate::types::*;
use rand::seq::IndexedRandom;

const SYSTEM_PROMPT: &str = "You are a short-form social-deduction gamer. \
    Produce a single short sentence (at most 30 words) appropriate for the role. \
    If the role is crewmate, you may hint at the secret word without stating it exactly. \
    If the role is imposter, be evasive and subtly deflect suspicion.";

const BOT_TEMPERATURE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotRole {
    Crewmate,
    Imposter,
}

impl BotRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crewmate => "crewmate",
            Self::Imposter => "imposter",
        }
    }
}

/// Everything a bot may know when it is its turn to speak
#[derive(Debug, Clone)]
pub struct BotContext {
    pub bot_name: String,
    pub role: BotRole,
    pub player_names: Vec<String>,
    /// Only ever set for crewmates
    pub secret_word: Option<String>,
}

impl BotContext {
    pub fn from_room(room: &Room, bot_id: &str) -> Option<Self> {
        let bot = room.player(bot_id)?;
        let role = if bot.is_imposter {
            BotRole::Imposter
        } else {
            BotRole::Crewmate
        };
        Some(Self {
            bot_name: bot.name.clone(),
            role,
            player_names: room
                .players
                .iter()
                .filter(|p| !p.has_left)
                .map(|p| p.name.clone())
                .collect(),
            secret_word: match role {
                BotRole::Crewmate => room.secret_word.clone(),
                BotRole::Imposter => None,
            },
        })
    }

    fn prompt(&self) -> String {
        let mut prompt = format!(
            "Role: {}\nPlayers: {}",
            self.role.as_str(),
            self.player_names.join(", ")
        );
        if let Some(word) = &self.secret_word {
            prompt.push_str(&format!("\nSecret word (do NOT say it verbatim): {}", word));
        }
        prompt.push_str("\nRespond with a single sentence only.");
        prompt
    }
}

/// Canned line used when no LLM answer is available
pub fn heuristic_statement(ctx: &BotContext) -> String {
    match ctx.role {
        BotRole::Imposter => {
            let others: Vec<&String> = ctx
                .player_names
                .iter()
                .filter(|name| **name != ctx.bot_name)
                .collect();
            let target = others
                .choose(&mut rand::rng())
                .map(|name| name.as_str())
                .unwrap_or("someone");
            format!("I think {} seems suspicious, they were quiet.", target)
        }
        BotRole::Crewmate => match ctx.secret_word.as_deref().and_then(|w| w.chars().next()) {
            Some(initial) => format!(
                "I noticed something about the task, maybe related to {}...",
                initial
            ),
            None => "I didn't see much, but I agree we should keep an eye on others.".to_string(),
        },
    }
}

/// Ask the LLM for a statement, falling back to the heuristic. The result
/// never contains the secret word verbatim.
pub async fn generate_statement(
    llm: Option<&LlmManager>,
    config: &LlmConfig,
    ctx: &BotContext,
) -> String {
    let Some(llm) = llm else {
        return heuristic_statement(ctx);
    };

    let request = GenerateRequest {
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
        prompt: ctx.prompt(),
        max_tokens: Some(config.default_max_tokens),
        temperature: Some(BOT_TEMPERATURE),
        timeout: config.default_timeout,
    };

    match llm.generate_first(request).await {
        Ok(response) if !leaks_word(&response.text, ctx.secret_word.as_deref()) => response.text,
        Ok(_) => {
            tracing::warn!(
                "LLM statement for {} leaked the secret word, using heuristic",
                ctx.bot_name
            );
            heuristic_statement(ctx)
        }
        Err(e) => {
            tracing::warn!(
                "Bot statement generation for {} failed: {}, using heuristic",
                ctx.bot_name,
                e
            );
            heuristic_statement(ctx)
        }
    }
}

fn leaks_word(text: &str, secret_word: Option<&str>) -> bool {
    secret_word.is_some_and(|word| text.to_lowercase().contains(&word.to_lowercase()))
}

/// Random ballot among the other alive players; skip when nobody else is left
pub fn pick_vote(room: &Room, bot_id: &str) -> VoteChoice {
    let candidates: Vec<&Player> = room.alive_players().filter(|p| p.id != bot_id).collect();
    candidates
        .choose(&mut rand::rng())
        .map(|p| VoteChoice::Player(p.id.clone()))
        .unwrap_or(VoteChoice::Skip)
}

/// Display name for a new bot, unique within the room
pub fn bot_name(room: &Room) -> String {
    for _ in 0..8 {
        let name = petname::petname(2, " ")
            .map(|n| format!("Bot {}", title_case(&n)))
            .unwrap_or_else(|| "Bot".to_string());
        if !room.players.iter().any(|p| p.name == name) {
            return name;
        }
    }
    format!("Bot {}", room.players.len() + 1)
}

fn title_case(words: &str) -> String {
    words
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Random cosmetic look for a bot
pub fn random_customization() -> Customization {
    let mut rng = rand::rng();
    let mut pick = |options: &[&str]| {
        options
            .choose(&mut rng)
            .copied()
            .unwrap_or_default()
            .to_string()
    };
    Customization {
        skin: pick(SKINS),
        face: pick(FACES),
        hat: pick(HATS),
    }
}
