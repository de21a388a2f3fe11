mod checks;
mod concurrency;
mod evaluators;
