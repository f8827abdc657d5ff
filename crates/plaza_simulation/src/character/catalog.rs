//! Character catalog (имена персонажей и их looks)
//!
//! Модели грузит внешний loader; здесь только `data[] -> {name, looks[]}`.

use bevy::prelude::*;
use thiserror::Error;

/// Missing-asset ошибки загрузки персонажа.
///
/// Не ретраятся: персонаж просто не появляется.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("unknown character `{0}`")]
    UnknownCharacter(String),

    #[error("character `{name}` has no look #{look}")]
    UnknownLook { name: String, look: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterData {
    pub name: String,
    /// Источник модели для каждого look'а
    pub looks: Vec<String>,
}

impl CharacterData {
    pub fn new(name: impl Into<String>, looks: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            looks: looks.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct CharacterCatalog {
    pub data: Vec<CharacterData>,
}

impl Default for CharacterCatalog {
    fn default() -> Self {
        Self::default_roster()
    }
}

impl CharacterCatalog {
    pub fn new(data: Vec<CharacterData>) -> Self {
        Self { data }
    }

    /// Стандартный набор персонажей клиента
    pub fn default_roster() -> Self {
        Self::new(
            ["Jenifer", "Jane", "Natasa", "Han"]
                .into_iter()
                .map(|name| CharacterData::new(name, [format!("/models/characters/{name}/1/model.fbx")]))
                .collect(),
        )
    }

    pub fn find_look(&self, name: &str, look: usize) -> Result<&str, SpawnError> {
        let character = self
            .data
            .iter()
            .find(|item| item.name == name)
            .ok_or_else(|| SpawnError::UnknownCharacter(name.to_string()))?;

        character
            .looks
            .get(look)
            .map(String::as_str)
            .ok_or_else(|| SpawnError::UnknownLook {
                name: name.to_string(),
                look,
            })
    }

    /// Наименее занятое имя среди `occupied`; ничья: по порядку каталога.
    ///
    /// Имена вне каталога игнорируются. `None` только для пустого каталога.
    pub fn least_used_name<'a>(&self, occupied: impl IntoIterator<Item = &'a str>) -> Option<&str> {
        let mut counts: Vec<(&str, usize)> =
            self.data.iter().map(|item| (item.name.as_str(), 0)).collect();

        for name in occupied {
            if let Some(entry) = counts.iter_mut().find(|(candidate, _)| *candidate == name) {
                entry.1 += 1;
            }
        }

        // min_by_key возвращает первый из равных минимумов
        counts
            .into_iter()
            .min_by_key(|(_, count)| *count)
            .map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_ab() -> CharacterCatalog {
        CharacterCatalog::new(vec![
            CharacterData::new("A", ["a.fbx"]),
            CharacterData::new("B", ["b.fbx"]),
        ])
    }

    #[test]
    fn test_empty_roster_picks_first_name() {
        let catalog = CharacterCatalog::default_roster();
        assert_eq!(catalog.least_used_name([]), Some("Jenifer"));
    }

    #[test]
    fn test_least_used_name_wins() {
        let catalog = catalog_ab();
        assert_eq!(catalog.least_used_name(["A", "A", "B"]), Some("B"));
        assert_eq!(catalog.least_used_name(["A", "B", "B"]), Some("A"));
    }

    #[test]
    fn test_ties_follow_catalog_order() {
        let catalog = catalog_ab();
        assert_eq!(catalog.least_used_name(["B", "A"]), Some("A"));
        assert_eq!(catalog.least_used_name(["Zed"]), Some("A"));
    }

    #[test]
    fn test_empty_catalog_has_no_name() {
        assert_eq!(CharacterCatalog::new(Vec::new()).least_used_name(["A"]), None);
    }

    #[test]
    fn test_find_look_errors() {
        let catalog = catalog_ab();
        assert_eq!(catalog.find_look("A", 0), Ok("a.fbx"));
        assert_eq!(
            catalog.find_look("C", 0),
            Err(SpawnError::UnknownCharacter("C".into()))
        );
        assert_eq!(
            catalog.find_look("B", 3),
            Err(SpawnError::UnknownLook { name: "B".into(), look: 3 })
        );
    }
}
