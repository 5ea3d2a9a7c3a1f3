//! Row aggregation for parent/child join results.
//!
//! # Responsibility
//! - Fold a flat row stream, duplicated per child by the join, into one
//!   entity per parent id.
//! - Keep first-seen parent order.
//!
//! # Invariants
//! - A parent row with only NULL/`0` child columns still yields an entity with
//!   empty association sets.
//! - Each association kind is collected independently; duplicated children
//!   collapse because association sets are sets.
//! - A row that cannot be decoded aborts the fold. Rows are never skipped.
//! - A decoded parent must carry the key its row was grouped under.

use super::{RepoError, RepoResult};
use crate::model::film::Film;
use crate::model::reference::Genre;
use crate::model::user::User;
use crate::model::UserId;
use std::collections::HashMap;

/// Entity that owns association sets filled from joined child rows.
pub trait Aggregate {
    /// One decoded child value, tagged with the association it belongs to.
    type Link;

    /// Parent id; must equal the decoder's `parent_key` for the same row.
    fn key(&self) -> i64;
    fn attach(&mut self, link: Self::Link);
}

/// Decodes one flat row of a parent-with-children join.
pub trait JoinDecoder<R: ?Sized> {
    type Entity: Aggregate;

    fn parent_key(&self, row: &R) -> RepoResult<i64>;
    /// Builds the parent with empty association sets.
    fn decode_parent(&self, row: &R) -> RepoResult<Self::Entity>;
    /// Children present on this row; empty when every child column is a sentinel.
    fn decode_links(&self, row: &R) -> RepoResult<Vec<<Self::Entity as Aggregate>::Link>>;
}

/// Order-preserving fold of join rows into entities.
#[derive(Debug)]
pub struct RowAggregator<E> {
    slots: HashMap<i64, usize>,
    entities: Vec<E>,
}

impl<E: Aggregate> Default for RowAggregator<E> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            entities: Vec::new(),
        }
    }
}

impl<E: Aggregate> RowAggregator<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one row into the aggregate.
    pub fn fold_row<R, D>(&mut self, decoder: &D, row: &R) -> RepoResult<()>
    where
        R: ?Sized,
        D: JoinDecoder<R, Entity = E>,
    {
        let key = decoder.parent_key(row)?;
        let slot = match self.slots.get(&key) {
            Some(slot) => *slot,
            None => {
                let parent = decoder.decode_parent(row)?;
                if parent.key() != key {
                    return Err(RepoError::Decode(format!(
                        "decoded parent key {} does not match row key {key}",
                        parent.key()
                    )));
                }
                self.entities.push(parent);
                let slot = self.entities.len() - 1;
                self.slots.insert(key, slot);
                slot
            }
        };

        for link in decoder.decode_links(row)? {
            self.entities[slot].attach(link);
        }
        Ok(())
    }

    pub fn get(&self, key: i64) -> Option<&E> {
        self.slots.get(&key).map(|slot| &self.entities[*slot])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in first-seen parent order.
    pub fn into_vec(self) -> Vec<E> {
        self.entities
    }
}

/// Folds a complete row sequence.
pub fn aggregate_rows<R, D, I>(decoder: &D, rows: I) -> RepoResult<Vec<D::Entity>>
where
    D: JoinDecoder<R>,
    I: IntoIterator<Item = R>,
{
    let mut aggregator = RowAggregator::new();
    for row in rows {
        aggregator.fold_row(decoder, &row)?;
    }
    Ok(aggregator.into_vec())
}

/// Maps the child-column sentinels (`NULL`, `0`) to "no child".
pub fn link_id(value: Option<i64>) -> Option<i64> {
    value.filter(|id| *id != 0)
}

/// Child values a film join can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilmLink {
    Genre(Genre),
    Like(UserId),
}

impl Aggregate for Film {
    type Link = FilmLink;

    fn key(&self) -> i64 {
        self.id
    }

    fn attach(&mut self, link: FilmLink) {
        match link {
            FilmLink::Genre(genre) => {
                self.genres.insert(genre);
            }
            FilmLink::Like(user_id) => {
                self.likes.insert(user_id);
            }
        }
    }
}

impl Aggregate for User {
    /// Friend (target) id.
    type Link = UserId;

    fn key(&self) -> i64 {
        self.id
    }

    fn attach(&mut self, friend_id: UserId) {
        self.friends.insert(friend_id);
    }
}

#[cfg(test)]
mod tests {
    use super::{aggregate_rows, link_id, FilmLink, JoinDecoder, RowAggregator};
    use crate::model::film::Film;
    use crate::model::reference::{Genre, Rating};
    use crate::repo::{RepoError, RepoResult};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    /// Flat join row: parent columns, then nullable genre and like columns.
    struct FlatRow {
        film_id: Option<i64>,
        name: &'static str,
        genre_id: Option<i64>,
        like_user_id: Option<i64>,
    }

    fn row(
        film_id: i64,
        name: &'static str,
        genre_id: Option<i64>,
        like_user_id: Option<i64>,
    ) -> FlatRow {
        FlatRow {
            film_id: Some(film_id),
            name,
            genre_id,
            like_user_id,
        }
    }

    struct FlatFilmDecoder;

    impl JoinDecoder<FlatRow> for FlatFilmDecoder {
        type Entity = Film;

        fn parent_key(&self, row: &FlatRow) -> RepoResult<i64> {
            row.film_id
                .ok_or_else(|| RepoError::Decode("missing film id".to_string()))
        }

        fn decode_parent(&self, row: &FlatRow) -> RepoResult<Film> {
            let mut film = Film::new(
                row.name,
                "",
                NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                90,
                Rating::new(1, "G"),
            );
            film.id = self.parent_key(row)?;
            Ok(film)
        }

        fn decode_links(&self, row: &FlatRow) -> RepoResult<Vec<FilmLink>> {
            let mut links = Vec::new();
            if let Some(id) = link_id(row.genre_id) {
                links.push(FilmLink::Genre(Genre::new(id, format!("genre-{id}"))));
            }
            if let Some(id) = link_id(row.like_user_id) {
                links.push(FilmLink::Like(id));
            }
            Ok(links)
        }
    }

    #[test]
    fn join_rows_for_one_film_collapse_into_one_entity() {
        let rows = vec![
            row(7, "Seven", Some(1), Some(9)),
            row(7, "Seven", Some(2), Some(9)),
            row(7, "Seven", Some(2), Some(9)),
        ];

        let films = aggregate_rows(&FlatFilmDecoder, rows).unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].id, 7);
        assert_eq!(films[0].genre_ids(), BTreeSet::from([1, 2]));
        assert_eq!(films[0].likes, BTreeSet::from([9]));
    }

    #[test]
    fn parents_keep_first_seen_order_and_childless_parents_survive() {
        let rows = vec![
            row(3, "Third", Some(1), None),
            row(1, "First", None, None),
            row(3, "Third", Some(4), Some(0)),
            row(2, "Second", Some(0), Some(5)),
        ];

        let films = aggregate_rows(&FlatFilmDecoder, rows).unwrap();
        let ids: Vec<i64> = films.iter().map(|film| film.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        assert_eq!(films[0].genre_ids(), BTreeSet::from([1, 4]));
        assert!(films[0].likes.is_empty());
        assert!(films[1].genres.is_empty());
        assert!(films[1].likes.is_empty());
        assert!(films[2].genres.is_empty());
        assert_eq!(films[2].likes, BTreeSet::from([5]));
    }

    #[test]
    fn empty_stream_yields_no_entities() {
        let films = aggregate_rows(&FlatFilmDecoder, Vec::<FlatRow>::new()).unwrap();
        assert!(films.is_empty());
    }

    #[test]
    fn malformed_row_aborts_the_fold() {
        let mut aggregator = RowAggregator::new();
        aggregator
            .fold_row(&FlatFilmDecoder, &row(1, "ok", None, None))
            .unwrap();

        let broken = FlatRow {
            film_id: None,
            name: "broken",
            genre_id: Some(1),
            like_user_id: None,
        };
        let err = aggregator.fold_row(&FlatFilmDecoder, &broken).unwrap_err();
        assert!(matches!(err, RepoError::Decode(_)));
        assert_eq!(aggregator.len(), 1);
        assert!(aggregator.get(1).is_some());
    }

    /// Decodes every parent under a fixed id, whatever the row says.
    struct MiskeyedDecoder;

    impl JoinDecoder<FlatRow> for MiskeyedDecoder {
        type Entity = Film;

        fn parent_key(&self, row: &FlatRow) -> RepoResult<i64> {
            FlatFilmDecoder.parent_key(row)
        }

        fn decode_parent(&self, row: &FlatRow) -> RepoResult<Film> {
            let mut film = FlatFilmDecoder.decode_parent(row)?;
            film.id = 100;
            Ok(film)
        }

        fn decode_links(&self, row: &FlatRow) -> RepoResult<Vec<FilmLink>> {
            FlatFilmDecoder.decode_links(row)
        }
    }

    #[test]
    fn parent_decoded_under_another_key_is_rejected() {
        let err = aggregate_rows(&MiskeyedDecoder, vec![row(7, "Seven", Some(1), None)])
            .unwrap_err();
        assert!(matches!(err, RepoError::Decode(message) if message.contains("row key 7")));
    }
}
