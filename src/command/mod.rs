//! Line parsing
//!
//! Turns one line of player input into a `Command`. Parsing never looks
//! at the world; resolving names to entities is the handlers' job.

use thiserror::Error;

use crate::combat::action::{
    AttackMove, CombatAction, CombatCommand, StancePreset, StanceRequest, TargetRef, TargetRequest,
};
use crate::components::{Limb, Posture};
use crate::core::types::Direction;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Combat(CombatCommand),
    Move(Direction),
    Posture(Posture),
    Enter(String),
    Look,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Say something.")]
    Empty,
    #[error("Huh? '{0}' isn't a command. Type 'help' for a list.")]
    UnknownVerb(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
Movement: n s e w ne nw se sw, go <dir>, enter <portal>, look
Posture: stand, sit, lie
Combat: attack [move] [target], slash/thrust/bash/punch/kick/shoot [target],
  reload, ammo, advance [target], retreat, close, withdraw, flee,
  iaijutsu [target], parry, hangback, stance [preset | reset | custom e p s [aggr]],
  target <limb | name | clear>, assess, appraise <name>
Automation: automate <action>, buffer <a>; <b>; ..., execute, stop
Other: help, quit";

fn split_verb(line: &str) -> (String, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb.to_lowercase(), rest.trim()),
        None => (line.to_lowercase(), ""),
    }
}

/// Parse a full input line
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    let (verb, rest) = split_verb(line);
    if verb.is_empty() {
        return Err(ParseError::Empty);
    }
    if let Some(direction) = Direction::parse(&verb) {
        return Ok(Command::Move(direction));
    }

    let command = match verb.as_str() {
        "go" | "walk" => Direction::parse(rest)
            .map(Command::Move)
            .ok_or(ParseError::Usage("go <direction>"))?,
        "stand" => Command::Posture(Posture::Standing),
        "sit" => Command::Posture(Posture::Sitting),
        "lie" | "rest" => Command::Posture(Posture::Lying),
        "enter" => Command::Enter(rest.to_string()),
        "look" | "l" => Command::Look,
        "help" | "?" => Command::Help,
        "quit" | "logout" => Command::Quit,
        "automate" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("automate <action>"));
            }
            Command::Combat(CombatCommand::Automate(parse_action(rest)?))
        }
        "buffer" => {
            let steps = rest
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_action)
                .collect::<Result<Vec<_>, _>>()?;
            if steps.is_empty() {
                return Err(ParseError::Usage("buffer <action>; <action>; ..."));
            }
            Command::Combat(CombatCommand::SetBuffer(steps))
        }
        "execute" => Command::Combat(CombatCommand::ExecuteBuffer),
        "stop" => Command::Combat(CombatCommand::Stop),
        _ => Command::Combat(CombatCommand::Act(parse_action(line)?)),
    };
    Ok(command)
}

/// Parse a single combat action, as typed or as an automation step
pub fn parse_action(line: &str) -> Result<CombatAction, ParseError> {
    let (verb, rest) = split_verb(line);
    let target = TargetRef::from_words(rest);

    if let Some(attack_move) = AttackMove::parse(&verb) {
        return Ok(CombatAction::Attack {
            target,
            attack_move: Some(attack_move),
        });
    }

    let action = match verb.as_str() {
        "attack" | "kill" | "k" | "hit" => {
            let (first, after) = split_verb(rest);
            match AttackMove::parse(&first) {
                Some(attack_move) => CombatAction::Attack {
                    target: TargetRef::from_words(after),
                    attack_move: Some(attack_move),
                },
                None => CombatAction::Attack {
                    target,
                    attack_move: None,
                },
            }
        }
        "reload" => CombatAction::Reload,
        "ammo" => CombatAction::CheckAmmo,
        "check" if rest.eq_ignore_ascii_case("ammo") => CombatAction::CheckAmmo,
        "advance" | "approach" => CombatAction::Advance { target },
        "retreat" => CombatAction::Retreat,
        "close" => CombatAction::Close,
        "withdraw" => CombatAction::Withdraw,
        "flee" => CombatAction::Flee,
        "iaijutsu" | "iai" => CombatAction::Iaijutsu { target },
        "parry" => CombatAction::Parry,
        "hangback" => CombatAction::Hangback,
        "assess" => CombatAction::Assess,
        "appraise" => CombatAction::Appraise { target },
        "stance" => CombatAction::Stance(parse_stance(rest)?),
        "target" => CombatAction::Target(parse_target(rest)?),
        _ => return Err(ParseError::UnknownVerb(verb)),
    };
    Ok(action)
}

fn parse_stance(rest: &str) -> Result<StanceRequest, ParseError> {
    const USAGE: &str = "stance [offensive|neutral|defensive|evasive|guarded|reset] or stance custom <evasion> <parry> <shield> [aggression]";
    let words: Vec<&str> = rest.split_whitespace().collect();
    match words.as_slice() {
        [] => Ok(StanceRequest::Show),
        [reset] if reset.eq_ignore_ascii_case("reset") => Ok(StanceRequest::Reset),
        [preset] => StancePreset::parse(preset)
            .map(StanceRequest::Preset)
            .ok_or(ParseError::Usage(USAGE)),
        [custom, numbers @ ..] if custom.eq_ignore_ascii_case("custom") => {
            let (splits, aggression) = match numbers {
                [e, p, s] => ([e, p, s], None),
                [e, p, s, a] => ([e, p, s], Some(a)),
                _ => return Err(ParseError::Usage(USAGE)),
            };
            let mut values = [0u32; 3];
            for (slot, word) in values.iter_mut().zip(splits) {
                *slot = word.parse().map_err(|_| ParseError::Usage(USAGE))?;
            }
            let aggression = aggression
                .map(|a| a.parse::<f32>().map_err(|_| ParseError::Usage(USAGE)))
                .transpose()?;
            Ok(StanceRequest::Custom {
                evasion: values[0],
                parry: values[1],
                shield: values[2],
                aggression,
            })
        }
        _ => Err(ParseError::Usage(USAGE)),
    }
}

fn parse_target(rest: &str) -> Result<TargetRequest, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::Usage("target <head|torso|arms|legs|name|clear>"));
    }
    if rest.eq_ignore_ascii_case("clear") || rest.eq_ignore_ascii_case("none") {
        return Ok(TargetRequest::ClearLimb);
    }
    Ok(match Limb::parse(rest) {
        Some(limb) => TargetRequest::Limb(limb),
        None => TargetRequest::Combatant(TargetRef::Name(rest.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_and_posture() {
        assert_eq!(parse_line("n"), Ok(Command::Move(Direction::North)));
        assert_eq!(parse_line("go SouthWest"), Ok(Command::Move(Direction::Southwest)));
        assert_eq!(parse_line("sit"), Ok(Command::Posture(Posture::Sitting)));
        assert_eq!(parse_line("enter trapdoor"), Ok(Command::Enter("trapdoor".into())));
        assert_eq!(parse_line("go up"), Err(ParseError::Usage("go <direction>")));
    }

    #[test]
    fn test_attack_forms() {
        assert_eq!(
            parse_action("attack 2.goblin").unwrap(),
            CombatAction::Attack {
                target: TargetRef::Name("2.goblin".into()),
                attack_move: None
            }
        );
        assert_eq!(
            parse_action("attack kick second goblin").unwrap(),
            CombatAction::Attack {
                target: TargetRef::Name("second goblin".into()),
                attack_move: Some(AttackMove::Kick)
            }
        );
        assert_eq!(
            parse_action("shoot").unwrap(),
            CombatAction::Attack {
                target: TargetRef::Current,
                attack_move: Some(AttackMove::Shoot)
            }
        );
    }

    #[test]
    fn test_stance_parsing() {
        assert_eq!(
            parse_action("stance custom 50 40 20").unwrap(),
            CombatAction::Stance(StanceRequest::Custom {
                evasion: 50,
                parry: 40,
                shield: 20,
                aggression: None
            })
        );
        assert_eq!(
            parse_action("stance evasive").unwrap(),
            CombatAction::Stance(StanceRequest::Preset(StancePreset::Evasive))
        );
        assert!(matches!(parse_action("stance custom 1 2"), Err(ParseError::Usage(_))));
        assert_eq!(
            parse_action("stance reset").unwrap(),
            CombatAction::Stance(StanceRequest::Reset)
        );
    }

    #[test]
    fn test_target_forms() {
        assert_eq!(
            parse_action("target head").unwrap(),
            CombatAction::Target(TargetRequest::Limb(Limb::Head))
        );
        assert_eq!(
            parse_action("target clear").unwrap(),
            CombatAction::Target(TargetRequest::ClearLimb)
        );
        assert_eq!(
            parse_action("target bandit").unwrap(),
            CombatAction::Target(TargetRequest::Combatant(TargetRef::Name("bandit".into())))
        );
    }

    #[test]
    fn test_automation_verbs() {
        assert_eq!(
            parse_line("automate reload"),
            Ok(Command::Combat(CombatCommand::Automate(CombatAction::Reload)))
        );
        assert_eq!(
            parse_line("buffer advance; attack; retreat"),
            Ok(Command::Combat(CombatCommand::SetBuffer(vec![
                CombatAction::Advance {
                    target: TargetRef::Current
                },
                CombatAction::attack(""),
                CombatAction::Retreat,
            ])))
        );
        assert!(matches!(parse_line("automate stop"), Err(ParseError::UnknownVerb(_))));
        assert_eq!(parse_line("dance"), Err(ParseError::UnknownVerb("dance".into())));
        assert_eq!(parse_line("   "), Err(ParseError::Empty));
    }
}
