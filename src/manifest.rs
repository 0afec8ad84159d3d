//! Compile-time cache identity and precache manifest.

/// Cache name, acting as a version tag. Changing it starts a fresh store;
/// nothing deletes stores opened under older names.
pub const CACHE_NAME: &str = "gestione-spese-cache-v1";

/// Critical-path resources fetched and committed as one batch at install
/// time. Site-relative locators are resolved against the configured origin
/// when fetched, but cached under the locator exactly as the page requests
/// it.
pub const PRECACHE_MANIFEST: &[&str] = &[
  "/",
  "/statistiche",
  "/static/manifest.json",
  "/static/icon-192x192.png",
  "/static/icon-512x512.png",
  "https://cdn.jsdelivr.net/npm/chart.js",
];
