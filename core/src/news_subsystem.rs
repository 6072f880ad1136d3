//! Breaking news: political headlines that move the meters.
//!
//! Once per day: p = 0.1 + 0.02 · (executive orders + agency policies).
//! On a hit, pick a pool (executive 0.4, agency 0.3, legislature 0.3),
//! draw one headline never run before, apply its effects, and bump the
//! pool's tally. The tally feeds back into tomorrow's probability.
//!
//! Execution: every day, after the event dispatcher.

use crate::{
    config::{NewsItem, NewsPools},
    error::SimResult,
    event::SimEvent,
    rng::SimRng,
    state::SessionState,
    subsystem::SimSubsystem,
    types::Day,
};
use serde::{Deserialize, Serialize};

pub const BASE_NEWS_CHANCE: f64 = 0.1;
pub const NEWS_CHANCE_PER_TALLY: f64 = 0.02;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NewsPool {
    Executive,
    Agency,
    Legislature,
}

impl NewsPool {
    /// Map a uniform sample onto the 0.4 / 0.3 / 0.3 mixture.
    pub fn from_sample(x: f64) -> Self {
        if x < 0.4 {
            Self::Executive
        } else if x < 0.7 {
            Self::Agency
        } else {
            Self::Legislature
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::Executive   => "EXECUTIVE ORDER",
            Self::Agency      => "BREAKING NEWS",
            Self::Legislature => "CAPITOL REPORT",
        }
    }
}

/// A headline that ran, with the pool it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakingNews {
    pub pool: NewsPool,
    pub item: NewsItem,
}

/// Today's chance of a breaking-news interruption.
pub fn breaking_news_chance(state: &SessionState) -> f64 {
    let tally = state.political.executive_orders + state.political.agency_policies;
    BASE_NEWS_CHANCE + NEWS_CHANCE_PER_TALLY * tally as f64
}

pub struct NewsSubsystem {
    pools: NewsPools,
}

impl NewsSubsystem {
    pub fn new(pools: NewsPools) -> Self {
        Self { pools }
    }

    /// Pick a pool by the mixture weights and draw an unseen headline from
    /// it. `None` when the chosen pool is exhausted.
    pub fn draw_headline(&self, state: &mut SessionState, rng: &mut dyn SimRng) -> Option<BreakingNews> {
        let pool = NewsPool::from_sample(rng.next_f64());
        let history = &state.events.news_history;
        let fresh: Vec<&NewsItem> = self
            .pools
            .pool(pool)
            .iter()
            .filter(|n| !history.contains(&n.id))
            .collect();
        if fresh.is_empty() {
            return None;
        }
        let item = fresh[rng.pick_index(fresh.len())].clone();
        state.events.news_history.push(item.id.clone());
        Some(BreakingNews { pool, item })
    }

    /// Roll for breaking news; on a hit apply it and bump the tally.
    pub fn check_breaking_news(
        &self,
        state: &mut SessionState,
        rng:   &mut dyn SimRng,
    ) -> Option<BreakingNews> {
        if !rng.chance(breaking_news_chance(state)) {
            return None;
        }
        let news = self.draw_headline(state, rng)?;
        state.apply_effects(&news.item.effects, &format!("News: {}", news.item.headline));
        match news.pool {
            NewsPool::Executive   => state.political.executive_orders += 1,
            NewsPool::Agency      => state.political.agency_policies += 1,
            NewsPool::Legislature => {}
        }
        Some(news)
    }
}

impl SimSubsystem for NewsSubsystem {
    fn name(&self) -> &'static str {
        "news"
    }

    fn update(
        &mut self,
        day:   Day,
        state: &mut SessionState,
        rng:   &mut dyn SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let Some(news) = self.check_breaking_news(state, rng) else {
            return Ok(vec![]);
        };
        log::debug!("day={day} news [{}]: {}", news.pool.source(), news.item.headline);
        Ok(vec![SimEvent::BreakingNews {
            day,
            pool:     news.pool,
            item_id:  news.item.id,
            headline: news.item.headline,
        }])
    }
}
