//! Keyed card grid.
//!
//! Cards are matched between renders by the creature's id (or its name when
//! the id is missing), so a card that survives a re-render keeps its
//! `instance` and only has its data swapped.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::state::Creature;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridView {
    #[default]
    Loading,
    Cards,
    Empty,
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub instance: u64,
    pub key: String,
    pub creature: Creature,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub created: Vec<String>,
    pub reused: Vec<String>,
    pub destroyed: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CardGrid {
    view: GridView,
    cards: Vec<Card>,
    next_instance: u64,
}

pub fn card_key(creature: &Creature) -> Option<String> {
    if creature.id > 0 {
        return Some(creature.id.to_string());
    }
    let name = creature.name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

impl CardGrid {
    pub fn view(&self) -> &GridView {
        &self.view
    }

    /// Cards in display order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn render_creatures(&mut self, creatures: &[Creature]) -> Reconciliation {
        if creatures.is_empty() {
            let destroyed = self.destroy_all();
            self.view = GridView::Empty;
            return Reconciliation {
                destroyed,
                ..Reconciliation::default()
            };
        }

        let mut previous: HashMap<String, Card> = self
            .cards
            .drain(..)
            .map(|card| (card.key.clone(), card))
            .collect();

        let mut report = Reconciliation::default();
        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(creatures.len());

        for creature in creatures {
            let Some(key) = card_key(creature) else {
                continue;
            };
            if !seen.insert(key.clone()) {
                continue;
            }

            match previous.remove(&key) {
                Some(mut card) => {
                    card.creature = creature.clone();
                    report.reused.push(key);
                    next.push(card);
                }
                None => {
                    next.push(Card {
                        instance: self.allocate_instance(),
                        key: key.clone(),
                        creature: creature.clone(),
                    });
                    report.created.push(key);
                }
            }
        }

        report.destroyed = previous.into_keys().collect();
        report.destroyed.sort();

        self.cards = next;
        self.view = if self.cards.is_empty() {
            GridView::Empty
        } else {
            GridView::Cards
        };
        report
    }

    pub fn show_loading(&mut self) {
        self.destroy_all();
        self.view = GridView::Loading;
    }

    pub fn show_error(&mut self, message: &str) {
        self.destroy_all();
        self.view = GridView::Error(message.to_string());
    }

    fn destroy_all(&mut self) -> Vec<String> {
        self.cards.drain(..).map(|card| card.key).collect()
    }

    fn allocate_instance(&mut self) -> u64 {
        self.next_instance += 1;
        self.next_instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn creature(id: u32, name: &str) -> Creature {
        Creature {
            id,
            name: name.to_string(),
            types: vec!["normal".to_string()],
            artwork_url: None,
            sprite_url: None,
        }
    }

    fn keys(grid: &CardGrid) -> Vec<String> {
        grid.cards().iter().map(|card| card.key.clone()).collect()
    }

    fn instance_of(grid: &CardGrid, key: &str) -> Option<u64> {
        grid.cards()
            .iter()
            .find(|card| card.key == key)
            .map(|card| card.instance)
    }

    #[test]
    fn reuses_surviving_cards_and_drops_the_rest() {
        let mut grid = CardGrid::default();
        grid.render_creatures(&[creature(1, "a"), creature(2, "b"), creature(3, "c")]);
        let c_before = instance_of(&grid, "3");

        let report = grid.render_creatures(&[creature(3, "c"), creature(4, "d")]);

        assert_eq!(keys(&grid), vec!["3", "4"]);
        assert_eq!(instance_of(&grid, "3"), c_before);
        assert_eq!(report.reused, vec!["3"]);
        assert_eq!(report.created, vec!["4"]);
        assert_eq!(report.destroyed, vec!["1", "2"]);
        assert_eq!(grid.view(), &GridView::Cards);
    }

    #[test]
    fn order_follows_new_list_not_previous_order() {
        let mut grid = CardGrid::default();
        grid.render_creatures(&[creature(1, "a"), creature(2, "b")]);
        let a = instance_of(&grid, "1");
        let b = instance_of(&grid, "2");

        grid.render_creatures(&[creature(2, "b"), creature(1, "a")]);

        assert_eq!(keys(&grid), vec!["2", "1"]);
        assert_eq!(instance_of(&grid, "1"), a);
        assert_eq!(instance_of(&grid, "2"), b);
    }

    #[test]
    fn reused_card_gets_new_data() {
        let mut grid = CardGrid::default();
        grid.render_creatures(&[creature(7, "squirtle")]);

        let mut updated = creature(7, "squirtle");
        updated.types = vec!["water".to_string()];
        grid.render_creatures(&[updated.clone()]);

        assert_eq!(grid.cards()[0].creature, updated);
    }

    #[test]
    fn key_falls_back_to_name() {
        let mut grid = CardGrid::default();
        grid.render_creatures(&[creature(0, "missingno"), creature(0, "")]);

        assert_eq!(keys(&grid), vec!["missingno"]);
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let mut grid = CardGrid::default();
        grid.render_creatures(&[creature(5, "first"), creature(5, "second")]);

        assert_eq!(grid.cards().len(), 1);
        assert_eq!(grid.cards()[0].creature.name, "first");
    }

    #[test]
    fn empty_list_shows_empty_state() {
        let mut grid = CardGrid::default();
        grid.render_creatures(&[creature(1, "a")]);

        let report = grid.render_creatures(&[]);

        assert_eq!(grid.view(), &GridView::Empty);
        assert!(grid.cards().is_empty());
        assert_eq!(report.destroyed, vec!["1"]);
    }

    #[test]
    fn loading_and_error_destroy_cards() {
        let mut grid = CardGrid::default();
        grid.render_creatures(&[creature(1, "a")]);
        let first = instance_of(&grid, "1");

        grid.show_loading();
        assert_eq!(grid.view(), &GridView::Loading);
        assert!(grid.cards().is_empty());

        grid.render_creatures(&[creature(1, "a")]);
        assert_ne!(instance_of(&grid, "1"), first);

        grid.show_error("boom");
        assert_eq!(grid.view(), &GridView::Error("boom".to_string()));
        assert!(grid.cards().is_empty());
    }
}
