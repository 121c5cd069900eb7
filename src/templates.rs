use maud::{DOCTYPE, Markup, html};

use crate::{
    entities::genre,
    models::{Actor, Character, Movie, MovieField, MovieFilter, MovieForm},
    resolver::Conflict,
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT_CLASS: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const BUTTON_CLASS: &str =
    "rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";

/// What the movie form is being shown for.
#[derive(Clone, Copy, Debug)]
pub enum FormMode {
    Create,
    Edit(i32),
}

/// Banner shown above a re-rendered movie form.
#[derive(Clone, Copy, Debug)]
pub enum Notice<'a> {
    None,
    Invalid(&'a str),
    Modified(&'a Conflict),
    Deleted,
}

pub fn movie_list_page(movies: &[Movie], genres: &[genre::Model], filter: &MovieFilter) -> String {
    page(
        "Movies",
        html! {
            div class="flex items-start justify-between gap-6" {
                h1 class="text-3xl font-bold text-gray-900" { "Movies" }
                a class=(BUTTON_CLASS) href="/movies/new" { "Create new" }
            }

            form class="mt-6 flex flex-wrap items-end gap-4" method="get" action="/movies" {
                div {
                    label class="block text-sm font-medium text-gray-700" for="genre" { "Genre" }
                    select class=(INPUT_CLASS) name="genre" id="genre" {
                        option value="" { "All" }
                        @for g in genres {
                            option value=(g.name) selected[filter.genre() == Some(g.name.as_str())] { (g.name) }
                        }
                    }
                }
                div {
                    label class="block text-sm font-medium text-gray-700" for="search" { "Title" }
                    input class=(INPUT_CLASS) name="search" id="search" value=(filter.search().unwrap_or_default());
                }
                button class=(BUTTON_CLASS) type="submit" { "Filter" }
            }

            @if movies.is_empty() {
                div class="mt-10 bg-white shadow rounded-lg p-8" {
                    p class="text-gray-600" { "No movies found." }
                }
            } @else {
                table class="mt-8 w-full bg-white shadow rounded-lg text-left text-sm" {
                    thead class="border-b text-gray-500" {
                        tr {
                            th class="p-3" { "Title" }
                            th class="p-3" { "Director" }
                            th class="p-3" { "Release Date" }
                            th class="p-3" { "Genre" }
                            th class="p-3 text-right" { "Gross" }
                            th class="p-3 text-right" { "Rating" }
                            th class="p-3" {}
                        }
                    }
                    tbody {
                        @for movie in movies {
                            tr class="border-b last:border-0" {
                                td class="p-3 font-medium text-gray-900" { (movie.fields.title) }
                                td class="p-3" { (movie.fields.director) }
                                td class="p-3" { (movie.fields.release_date.to_string()) }
                                td class="p-3" {
                                    @let name = genre_name(genres, movie.fields.genre_id);
                                    a class="text-blue-600 hover:text-blue-800" href=(format!("/movies?genre={}", urlencoding::encode(name))) { (name) }
                                }
                                td class="p-3 text-right" { "$" (movie.fields.gross.to_string()) }
                                td class="p-3 text-right" { (movie.fields.rating.to_string()) }
                                td class="p-3 text-right whitespace-nowrap space-x-2" {
                                    a class="text-blue-600 hover:text-blue-800" href=(format!("/movies/{}/edit", movie.id)) { "Edit" }
                                    a class="text-blue-600 hover:text-blue-800" href=(format!("/movies/{}", movie.id)) { "Details" }
                                    a class="text-red-600 hover:text-red-800" href=(format!("/movies/{}/delete", movie.id)) { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn movie_details_page(
    movie: &Movie,
    genre: &genre::Model,
    characters: &[Character],
    actors: &[Actor],
) -> String {
    page(
        &movie.fields.title,
        html! {
            div class="bg-white shadow rounded-lg p-8" {
                h1 class="text-3xl font-bold text-gray-900" { (movie.fields.title) }
                (movie_summary(movie, &genre.name))

                h2 class="mt-8 text-xl font-semibold text-gray-900" { "Cast" }
                @if characters.is_empty() {
                    p class="mt-2 text-sm text-gray-500" { "No characters recorded." }
                } @else {
                    ul class="mt-2 space-y-1" {
                        @for c in characters {
                            li class="text-sm text-gray-700" {
                                span class="font-medium" { (c.actor_name) }
                                span class="text-gray-500" { " as " (c.character) }
                            }
                        }
                    }
                }

                @if !actors.is_empty() {
                    form class="mt-6 flex flex-wrap items-end gap-4" method="post" action=(format!("/movies/{}/characters", movie.id)) {
                        div {
                            label class="block text-sm font-medium text-gray-700" for="actor_id" { "Actor" }
                            select class=(INPUT_CLASS) name="actor_id" id="actor_id" {
                                @for a in actors {
                                    option value=(a.id) { (a.name) }
                                }
                            }
                        }
                        div {
                            label class="block text-sm font-medium text-gray-700" for="character" { "Character" }
                            input class=(INPUT_CLASS) name="character" id="character" required;
                        }
                        button class=(BUTTON_CLASS) type="submit" { "Add" }
                    }
                }

                div class="mt-8 space-x-4" {
                    a class="text-blue-600 hover:text-blue-800" href=(format!("/movies/{}/edit", movie.id)) { "Edit" }
                    a class="text-blue-600 hover:text-blue-800" href="/movies" { "Back to list" }
                }
            }
        },
    )
}

pub fn movie_form_page(
    mode: FormMode,
    form: &MovieForm,
    genres: &[genre::Model],
    notice: Notice<'_>,
) -> String {
    let (title, action) = match mode {
        FormMode::Create => ("Create movie", "/movies".to_string()),
        FormMode::Edit(id) => ("Edit movie", format!("/movies/{id}/edit")),
    };
    let conflict = match notice {
        Notice::Modified(conflict) => Some(conflict),
        _ => None,
    };
    let current = |field: MovieField| conflict.and_then(|c| c.change(field));
    let row_version =
        conflict.map(|c| c.row_version.to_string()).unwrap_or_else(|| form.row_version.clone());

    page(
        title,
        html! {
            div class="max-w-2xl bg-white shadow rounded-lg p-8" {
                h1 class="text-3xl font-bold text-gray-900" { (title) }

                @match notice {
                    Notice::None => {},
                    Notice::Invalid(message) => {
                        (banner("border-red-500", message))
                    },
                    Notice::Modified(_) => {
                        (banner(
                            "border-yellow-500",
                            "The record you attempted to edit was modified by another user after you got the original value. \
                             The edit operation was canceled and the current values in the database are shown below each field. \
                             If you still want to edit this record, click Save again.",
                        ))
                    },
                    Notice::Deleted => {
                        (banner("border-red-500", "Unable to save changes. The movie was deleted by another user."))
                    },
                }

                form class="mt-8 space-y-6" method="post" action=(action) {
                    input type="hidden" name="row_version" value=(row_version);
                    (text_input("title", MovieField::Title, &form.title, "text", current(MovieField::Title)))
                    (text_input("director", MovieField::Director, &form.director, "text", current(MovieField::Director)))
                    (text_input("release_date", MovieField::ReleaseDate, &form.release_date, "date", current(MovieField::ReleaseDate)))
                    (text_input("gross", MovieField::Gross, &form.gross, "text", current(MovieField::Gross)))
                    (text_input("rating", MovieField::Rating, &form.rating, "text", current(MovieField::Rating)))

                    div {
                        label class="block text-sm font-medium text-gray-700" for="genre_id" { (MovieField::GenreId.label()) }
                        select class=(INPUT_CLASS) name="genre_id" id="genre_id" {
                            @for g in genres {
                                option value=(g.id) selected[form.genre_id == g.id.to_string()] { (g.name) }
                            }
                        }
                        @if let Some(id) = current(MovieField::GenreId) {
                            @let name = id.parse().map(|id| genre_name(genres, id)).unwrap_or(id);
                            (current_value(name))
                        }
                    }

                    button class=(BUTTON_CLASS) type="submit" { "Save" }
                }

                a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/movies" { "Back to list" }
            }
        },
    )
}

pub fn delete_page(movie: &Movie, genre_name: &str, conflict: Option<&Conflict>) -> String {
    let row_version = conflict.map_or(&movie.row_version, |c| &c.row_version).to_string();

    page(
        "Delete movie",
        html! {
            div class="max-w-2xl bg-white shadow rounded-lg p-8" {
                h1 class="text-3xl font-bold text-gray-900" { "Delete " (movie.fields.title) "?" }

                @if conflict.is_some() {
                    (banner(
                        "border-yellow-500",
                        "The record you attempted to delete was modified by another user after you got the original values. \
                         The delete operation was canceled and the current values in the database are displayed. \
                         If you still want to delete this record, click Delete again.",
                    ))
                } @else {
                    p class="mt-2 text-gray-600" { "Are you sure you want to delete this movie?" }
                }

                (movie_summary(movie, genre_name))

                form class="mt-8 flex items-center gap-4" method="post" action=(format!("/movies/{}/delete", movie.id)) {
                    input type="hidden" name="row_version" value=(row_version);
                    button class="rounded-md bg-red-600 px-4 py-2 font-semibold text-white hover:bg-red-700" type="submit" { "Delete" }
                    a class="text-blue-600 hover:text-blue-800" href="/movies" { "Back to list" }
                }
            }
        },
    )
}

pub fn genres_page(genres: &[(genre::Model, u64)], error: Option<&str>) -> String {
    page(
        "Genres",
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Genres" }
            @if let Some(message) = error {
                (banner("border-red-500", message))
            }

            ul class="mt-6 bg-white shadow rounded-lg divide-y" {
                @for (g, count) in genres {
                    li class="p-4" {
                        a class="font-medium text-blue-600 hover:text-blue-800" href=(format!("/movies?genre={}", urlencoding::encode(&g.name))) { (g.name) }
                        span class="ml-2 text-sm text-gray-500" { "(" (count) ")" }
                        @if let Some(description) = &g.description {
                            p class="text-sm text-gray-600" { (description) }
                        }
                    }
                }
            }

            form class="mt-8 max-w-xl space-y-4" method="post" action="/genres" {
                div {
                    label class="block text-sm font-medium text-gray-700" for="name" { "Name" }
                    input class=(INPUT_CLASS) name="name" id="name" required;
                }
                div {
                    label class="block text-sm font-medium text-gray-700" for="description" { "Description" }
                    input class=(INPUT_CLASS) name="description" id="description";
                }
                button class=(BUTTON_CLASS) type="submit" { "Add genre" }
            }
        },
    )
}

pub fn actors_page(actors: &[Actor], error: Option<&str>) -> String {
    page(
        "Actors",
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Actors" }
            @if let Some(message) = error {
                (banner("border-red-500", message))
            }

            ul class="mt-6 bg-white shadow rounded-lg divide-y" {
                @for a in actors {
                    li class="p-4" {
                        span class="font-medium text-gray-900" { (a.name) }
                        span class="ml-2 text-sm text-gray-500" { "born " (a.birth_date.to_string()) }
                    }
                }
            }

            form class="mt-8 max-w-xl space-y-4" method="post" action="/actors" {
                div {
                    label class="block text-sm font-medium text-gray-700" for="name" { "Name" }
                    input class=(INPUT_CLASS) name="name" id="name" required;
                }
                div {
                    label class="block text-sm font-medium text-gray-700" for="birth_date" { "Birth date" }
                    input class=(INPUT_CLASS) type="date" name="birth_date" id="birth_date" required;
                }
                button class=(BUTTON_CLASS) type="submit" { "Add actor" }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="max-w-xl bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { "Error" }
                p class="mt-4 text-gray-700" { (message) }
                a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/movies" { "Back" }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                nav class="bg-white shadow" {
                    div class="max-w-5xl mx-auto px-6 py-4 flex gap-6 text-sm font-medium" {
                        a class="text-gray-900" href="/movies" { "Movies" }
                        a class="text-gray-600 hover:text-gray-900" href="/genres" { "Genres" }
                        a class="text-gray-600 hover:text-gray-900" href="/actors" { "Actors" }
                    }
                }
                main class="max-w-5xl mx-auto px-6 py-10" { (body) }
            }
        }
    }
    .into_string()
}

fn banner(border: &str, message: &str) -> Markup {
    html! {
        div class=(format!("mt-6 border-l-4 {border} bg-gray-50 p-4 text-sm text-gray-800")) role="alert" {
            (message)
        }
    }
}

fn current_value(value: &str) -> Markup {
    html! {
        p class="mt-1 text-sm text-red-600" { "Current value: " (value) }
    }
}

fn text_input(name: &str, field: MovieField, value: &str, kind: &str, current: Option<&str>) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (field.label()) }
            input class=(INPUT_CLASS) type=(kind) name=(name) id=(name) value=(value);
            @if let Some(current) = current {
                (current_value(current))
            }
        }
    }
}

fn movie_summary(movie: &Movie, genre_name: &str) -> Markup {
    html! {
        dl class="mt-6 grid grid-cols-3 gap-x-4 gap-y-2 text-sm" {
            dt class="font-medium text-gray-500" { (MovieField::Director.label()) }
            dd class="col-span-2 text-gray-900" { (movie.fields.director) }
            dt class="font-medium text-gray-500" { (MovieField::ReleaseDate.label()) }
            dd class="col-span-2 text-gray-900" { (movie.fields.release_date.to_string()) }
            dt class="font-medium text-gray-500" { (MovieField::Gross.label()) }
            dd class="col-span-2 text-gray-900" { "$" (movie.fields.gross.to_string()) }
            dt class="font-medium text-gray-500" { (MovieField::Rating.label()) }
            dd class="col-span-2 text-gray-900" { (movie.fields.rating.to_string()) }
            dt class="font-medium text-gray-500" { (MovieField::GenreId.label()) }
            dd class="col-span-2 text-gray-900" { (genre_name) }
        }
    }
}

fn genre_name(genres: &[genre::Model], id: i32) -> &str {
    genres.iter().find(|g| g.id == id).map_or("Unknown", |g| g.name.as_str())
}
