pub mod factory;
pub mod filters;
pub mod movie;
pub mod user;
pub mod validation;

pub use factory::MovieFactory;
pub use filters::{
    encode_query, FilterCriteria, FilterError, FilterPatch, FindAllParams, ListQuery, SortBy,
    SortOrder, DEFAULT_TAKE, MAX_TAKE,
};
pub use movie::{AgeRating, FilterOptions, Movie, MovieInput, MoviePage, MovieRow, NumericInput};
pub use user::{AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, User};
pub use validation::{ValidationError, Validator};
