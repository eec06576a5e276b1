use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    sea_query::{Expr, Func},
};

use crate::entities::{genre, movie_genre};

/// Master English -> Spanish genre table. Canonical names on the right must
/// match how genres are stored in the catalog.
const GENRE_MAP: &[(&str, &str)] = &[
    ("Action", "Acción"),
    ("Adventure", "Aventura"),
    ("Animation", "Animación"),
    ("Biography", "Biografía"),
    ("Comedy", "Comedia"),
    ("Crime", "Crimen"),
    ("Documentary", "Documental"),
    ("Drama", "Drama"),
    ("Family", "Familia"),
    ("Fantasy", "Fantasía"),
    ("Film-Noir", "Cine Negro"),
    ("History", "Historia"),
    ("Horror", "Terror"),
    ("Music", "Música"),
    ("Musical", "Musical"),
    ("Mystery", "Misterio"),
    ("Romance", "Romance"),
    ("Sci-Fi", "Ciencia Ficción"),
    ("Short", "Cortometraje"),
    ("Sport", "Deporte"),
    ("Superhero", "Superhéroes"),
    ("Thriller", "Suspenso"),
    ("War", "Guerra"),
    ("Western", "Western"),
];

/// Canonical Spanish name for a provider genre token. Unknown tokens pass
/// through unchanged.
pub fn canonical_name(raw: &str) -> &str {
    GENRE_MAP
        .iter()
        .find(|(source, _)| source.eq_ignore_ascii_case(raw))
        .map(|(_, canonical)| *canonical)
        .unwrap_or(raw)
}

/// Splits a raw comma-separated provider genre string, canonicalizes each
/// token and links the resulting genres to the movie. Linking is idempotent;
/// genres are created on first sight.
pub async fn link_genres<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    raw_genres: &str,
) -> Result<(), DbErr> {
    for token in raw_genres.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let genre = find_or_create(conn, canonical_name(token)).await?;

        let linked = movie_genre::Entity::find_by_id((movie_id, genre.id)).one(conn).await?;
        if linked.is_none() {
            movie_genre::Entity::insert(movie_genre::ActiveModel {
                movie_id: Set(movie_id),
                genre_id: Set(genre.id),
            })
            .exec_without_returning(conn)
            .await?;
        }
    }
    Ok(())
}

/// Case-insensitive lookup-before-create. Creation flushes immediately so the
/// genre has a stable id before any link is made.
pub async fn find_or_create<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<genre::Model, DbErr> {
    if let Some(existing) = find_canonical(conn, name).await? {
        return Ok(existing);
    }

    let created =
        genre::ActiveModel { name: Set(name.to_string()), ..Default::default() }.insert(conn).await;

    match created {
        Ok(model) => Ok(model),
        // Lost the create race: the unique index on name means another writer
        // committed the same canonical genre first, so re-fetch.
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            find_canonical(conn, name).await?.ok_or(err)
        },
        Err(err) => Err(err),
    }
}

async fn find_canonical<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<genre::Model>, DbErr> {
    genre::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(genre::Column::Name))).eq(name.to_lowercase()))
        .one(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_tokens_map_to_spanish() {
        assert_eq!(canonical_name("Comedy"), "Comedia");
        assert_eq!(canonical_name("Sci-Fi"), "Ciencia Ficción");
        assert_eq!(canonical_name("Thriller"), "Suspenso");
        assert_eq!(canonical_name("Film-Noir"), "Cine Negro");
    }

    #[test]
    fn source_tokens_match_case_insensitively() {
        assert_eq!(canonical_name("comedy"), "Comedia");
        assert_eq!(canonical_name("COMEDY"), "Comedia");
        assert_eq!(canonical_name("horror"), "Terror");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        assert_eq!(canonical_name("Telenovela"), "Telenovela");
        assert_eq!(canonical_name("Western"), "Western");
    }
}
