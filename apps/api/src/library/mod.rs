// Saved prompts and server-side favorites. Both live in the `prompts` table;
// favorites are simply the prompts owned by the signed-in user.

pub mod handlers;
