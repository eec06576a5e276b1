use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
    sea_query::{Expr, Func},
};

use crate::{entities::movie, genres};

/// Resolves a free-text title against the catalog: case-insensitive exact
/// match first, then case-insensitive substring match. Read-only. Ties on the
/// substring pass resolve to whichever row the store returns first.
pub async fn resolve_title<C: ConnectionTrait>(
    conn: &C,
    title: &str,
) -> Result<Option<movie::Model>, DbErr> {
    let exact = movie::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(movie::Column::Title))).eq(title.to_lowercase()))
        .one(conn)
        .await?;
    if exact.is_some() {
        return Ok(exact);
    }

    movie::Entity::find().filter(movie::Column::Title.contains(title)).one(conn).await
}

#[derive(Clone, Debug, Default)]
pub struct NewMovie {
    pub title: String,
    pub description: Option<String>,
    pub poster: Option<String>,
    pub trailer_url: Option<String>,
    pub rating: f64,
    pub runtime: Option<String>,
    pub year: Option<i32>,
}

/// Creates a catalog entry and its genre links in one transaction. The movie
/// insert flushes first so genre links have a stable foreign key; any failure
/// rolls the whole entry back.
pub async fn create_movie(
    db: &DatabaseConnection,
    fields: NewMovie,
    raw_genres: Option<&str>,
) -> Result<movie::Model, DbErr> {
    let txn = db.begin().await?;

    let model = movie::ActiveModel {
        title: Set(fields.title.clone()),
        slug: Set(slugify(&fields.title)),
        description: Set(fields.description),
        poster: Set(fields.poster),
        trailer_url: Set(fields.trailer_url),
        rating: Set(fields.rating),
        runtime: Set(fields.runtime),
        year: Set(fields.year),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(raw) = raw_genres {
        genres::link_genres(&txn, model.id, raw).await?;
    }

    txn.commit().await?;
    Ok(model)
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// ASCII-normalized slug derived from the title: accents folded, lowercased,
/// alphanumerics kept, whitespace and hyphen runs collapsed to one hyphen.
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());

    for c in title.chars() {
        let Some(folded) = fold_char(c) else { continue };
        if folded.is_ascii_alphanumeric() || folded == '_' {
            slug.push(folded);
        } else if (folded.is_ascii_whitespace() || folded == '-') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    (!slug.is_empty()).then(|| slug.to_string())
}

fn fold_char(c: char) -> Option<char> {
    Some(match c {
        'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        c if c.is_ascii() => c.to_ascii_lowercase(),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_fold_accents_and_punctuation() {
        assert_eq!(slugify("El Laberinto del Fauno").as_deref(), Some("el-laberinto-del-fauno"));
        assert_eq!(slugify("Amélie").as_deref(), Some("amelie"));
        assert_eq!(slugify("¿Qué pasó ayer?").as_deref(), Some("que-paso-ayer"));
        assert_eq!(slugify("Blade Runner 2049").as_deref(), Some("blade-runner-2049"));
    }

    #[test]
    fn slug_collapses_separator_runs() {
        assert_eq!(slugify("  Kill -- Bill  ").as_deref(), Some("kill-bill"));
    }

    #[test]
    fn empty_titles_yield_no_slug() {
        assert_eq!(slugify(""), None);
        assert_eq!(slugify("¡¡¡"), None);
    }
}
