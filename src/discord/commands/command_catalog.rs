// Discord commands module.
// Each feature gets its own command file.

use crate::discord::{Data, Error};

pub mod duel;
pub mod galleons;
pub mod help;
pub mod house_points;
pub mod magic;
pub mod presence;
pub mod room;

/// Every command Hedwig registers, prefix and slash alike.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        help::hedwighelp(),
        help::hedwigmod(),
        galleons::balance(),
        galleons::daily(),
        galleons::pay(),
        galleons::leaderboard(),
        galleons::givegalleons(),
        galleons::resetgalleons(),
        magic::shop(),
        magic::cast(),
        magic::drink(),
        magic::finite(),
        magic::effects(),
        room::choose(),
        room::trigger_game(),
        duel::duel(),
        duel::accept(),
        duel::decline(),
        house_points::points(),
        house_points::addpoints(),
        house_points::resetpoints(),
    ]
}
