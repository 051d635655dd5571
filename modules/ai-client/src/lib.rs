pub mod openai;
pub mod util;

pub use openai::{OpenAi, StructuredOutput};
pub use util::{close_truncated_array, strip_code_blocks, truncate_to_char_boundary};
